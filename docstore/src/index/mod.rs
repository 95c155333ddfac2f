//! Index definitions.
//!
//! An [IndexModel] names the key fields of an index with their directions and
//! carries its [IndexOptions]. Store backends validate models, derive default
//! names and enforce unique indexes.
mod model;
mod options;

pub use model::*;
pub use options::*;
