//! Image-recognition metadata and the external recognizer boundary.
//!
//! Recognition is produced by an external image-classification collaborator
//! and used only as a secondary ranking signal. The engine treats it as a
//! black box behind the [`ArtifactRecognizer`] trait; a failed per-row call
//! is substituted with a placeholder so one bad row never aborts a build.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder artifact type for unrecognized images.
pub const UNKNOWN_ARTIFACT_TYPE: &str = "未知文物";
/// Placeholder recognized name.
pub const UNKNOWN_NAME: &str = "未知";
/// Placeholder description when no recognition was attempted.
pub const NOT_RECOGNIZED: &str = "未进行识别";

/// Label/name/confidence/description triple from the recognition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub artifact_type: String,
    pub recognized_name: String,
    /// Recognition confidence in [0, 1]; 0.0 for placeholders.
    pub confidence: f32,
    pub description: String,
}

impl RecognitionResult {
    /// Neutral placeholder for rows where recognition was skipped.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::failed(NOT_RECOGNIZED)
    }

    /// Placeholder carrying a failure description, for rows where the
    /// recognizer was called but errored.
    #[must_use]
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            artifact_type: UNKNOWN_ARTIFACT_TYPE.to_string(),
            recognized_name: UNKNOWN_NAME.to_string(),
            confidence: 0.0,
            description: description.into(),
        }
    }

    /// True when the artifact type is absent or the unknown placeholder.
    #[must_use]
    pub fn type_is_placeholder(&self) -> bool {
        self.artifact_type.is_empty() || self.artifact_type == UNKNOWN_ARTIFACT_TYPE
    }

    /// True when the recognized name is absent or the unknown placeholder.
    #[must_use]
    pub fn name_is_placeholder(&self) -> bool {
        self.recognized_name.is_empty() || self.recognized_name == UNKNOWN_NAME
    }

    /// True when the description is absent or the not-recognized placeholder.
    #[must_use]
    pub fn description_is_placeholder(&self) -> bool {
        self.description.is_empty() || self.description == NOT_RECOGNIZED
    }

    /// Concatenated recognition text used by the hybrid overlap signal.
    #[must_use]
    pub fn image_text(&self) -> String {
        format!(
            "{} {} {}",
            self.artifact_type, self.recognized_name, self.description
        )
    }
}

/// Errors from the external recognition collaborator.
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Recognition client is not initialized")]
    Unavailable,

    #[error("Recognition request failed: {reason}")]
    Request { reason: String },

    #[error("Recognition request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// External image-recognition collaborator.
///
/// The corpus builder passes the configured per-call timeout with every
/// call; implementations must bound their work by it. The builder treats
/// every error as per-row and substitutes a placeholder.
pub trait ArtifactRecognizer {
    fn recognize(
        &self,
        image_url: &str,
        timeout: Duration,
    ) -> Result<RecognitionResult, RecognitionError>;
}
