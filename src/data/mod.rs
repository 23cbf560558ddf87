//! Data-provider collaborator: where the raw records and boundaries come from.

pub mod provider;

pub use provider::{DataProvider, Dataset, FileProvider, load_dataset};
