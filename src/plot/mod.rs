//! Renderer-side helpers: color scale and ASCII map.

pub mod ascii;
pub mod palette;

pub use ascii::render_ascii_map;
pub use palette::{Palette, Rgb};
