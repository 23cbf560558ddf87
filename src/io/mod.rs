//! Input/output helpers.
//!
//! - daily JSON + GeoJSON ingest (`ingest`)
//! - joined-frame GeoJSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
