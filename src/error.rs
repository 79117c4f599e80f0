//! Error types for the catalog retrieval engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for build and retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Source schema errors, fatal to a build attempt
    #[error(
        "Source file is missing required columns: {missing:?}. No rows were ingested; fix the source file and rebuild."
    )]
    SchemaError { missing: Vec<String> },

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Storage errors. Load failures are not represented here: a bad
    /// artifact pair is recoverable by rebuilding, so loading reports
    /// failure without an error value.
    #[error("Failed to persist index artifacts to '{path}': {source}")]
    PersistenceError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding table and vectorization errors
    #[error(transparent)]
    Embedding(#[from] crate::embedding::EmbeddingError),

    /// Exact-index errors
    #[error(transparent)]
    Index(#[from] crate::index::IndexError),

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl RetrievalError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::SchemaError { .. } => "SCHEMA_ERROR",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::PersistenceError { .. } => "PERSISTENCE_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::Index(_) => "INDEX_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::SchemaError { .. } => vec![
                "Check that the source file has the five required column headers",
                "Column labels must match the catalog export exactly",
            ],
            Self::PersistenceError { .. } => vec![
                "Run 'relicdex build --force' to rebuild from the source file",
                "Check disk space and permissions in the data directory",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Embedding(_) => vec![
                "Verify the embedding table path points at a word2vec text file",
                "Search still works in degraded mode without the table, with reduced quality",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;
