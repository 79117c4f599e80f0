//! Static word-embedding lookup and text vectorization.
//!
//! The engine embeds text with a pretrained token-to-vector table (word2vec
//! text format, 300 dimensions for the catalog model): tokens are looked up
//! individually, misses are dropped, and the document vector is the mean of
//! the matches. When nothing matches, or when the table failed to load at
//! all, vectorization degrades to the zero vector instead of failing, so
//! every document stays representable.

mod table;
mod vectorizer;

pub use table::EmbeddingTable;
pub use vectorizer::{TextVector, TextVectorizer};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the embedding table.
///
/// Vectorization itself never errors; a missing or broken table degrades
/// every vectorization to the zero-vector fallback instead.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to read embedding table '{path}': {source}")]
    TableRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Malformed embedding table '{path}' at line {line}: {reason}\nSuggestion: The table must be word2vec text format: one token followed by its vector components per line"
    )]
    MalformedTable {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Embedding table '{path}' is empty")]
    EmptyTable { path: PathBuf },

    #[error(transparent)]
    Type(#[from] crate::types::TypeError),
}
