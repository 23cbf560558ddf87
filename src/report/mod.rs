//! Formatted terminal output for frames and the date index.
//!
//! We keep formatting code in one place so output changes are localized.

pub mod format;

pub use format::*;
