//! Exact nearest-neighbor index over the corpus vectors.

mod flat;

pub use flat::{FlatIndex, SearchHit};

use thiserror::Error;

/// Errors from index construction, search, and the binary artifact.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Rebuild the index so all vectors come from the same embedding table"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid index artifact: {0}\nSuggestion: Run a forced rebuild to regenerate it")]
    InvalidFormat(String),

    #[error(
        "Index artifact version mismatch: expected {expected}, got {actual}\nSuggestion: Rebuild the index with this version of the engine"
    )]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
