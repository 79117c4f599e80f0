//! Corpus construction from the tabular catalog source.
//!
//! Reads source rows, normalizes fields, composes the labelled content text
//! per record, optionally folds in upstream recognition metadata, and emits
//! the (document, vector) batches the index is built from.

mod builder;
mod document;
mod recognition;
mod source;

pub use builder::{CorpusBuilder, compose_content};
pub use document::{Document, DocumentMetadata};
pub use recognition::{
    ArtifactRecognizer, NOT_RECOGNIZED, RecognitionError, RecognitionResult,
    UNKNOWN_ARTIFACT_TYPE, UNKNOWN_NAME,
};
pub use source::{
    COL_ARTIFACT_NAME, COL_CRAFT, COL_HISTORY, COL_IMAGE_URL, COL_NUMBER_PERIOD,
    REQUIRED_COLUMNS, SourceRow, read_source,
};
