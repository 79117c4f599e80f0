//! Document shapes persisted in the JSON sidecar.

use serde::{Deserialize, Serialize};

use crate::corpus::RecognitionResult;

/// One catalog entry, as indexed and as persisted in `documents.json`.
///
/// Immutable once built; the full document set is replaced atomically on
/// rebuild, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Labelled field lines joined by newlines; never empty in the corpus.
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Structured fields carried alongside the content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub artifact_name: String,
    pub image_url: String,
    pub number_period: String,
    pub history: String,
    pub craft: String,

    /// Zero-based row position in the tabular source. Stable across rebuilds
    /// of the same source, so it can identify an artifact between runs.
    pub source_row_index: usize,

    /// Upstream image-recognition triple, when a recognizer was configured
    /// at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognition_result: Option<RecognitionResult>,
}
