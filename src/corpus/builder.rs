//! Corpus construction: source rows to aligned (document, vector) batches.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::corpus::{
    ArtifactRecognizer, Document, DocumentMetadata, RecognitionResult, SourceRow,
};
use crate::embedding::TextVectorizer;

/// Content label for the artifact name line.
const LABEL_ARTIFACT_NAME: &str = "文物名称";
/// Content label for the number/period line.
const LABEL_NUMBER_PERIOD: &str = "编号年代";
/// Content label for the history line.
const LABEL_HISTORY: &str = "历史";
/// Content label for the craft line.
const LABEL_CRAFT: &str = "工艺";
/// Content label for the recognized artifact type line.
const LABEL_RECOGNIZED_TYPE: &str = "识别类型";
/// Content label for the recognized name line.
const LABEL_RECOGNIZED_NAME: &str = "识别名称";
/// Content label for the recognition description line.
const LABEL_RECOGNIZED_DESC: &str = "识别描述";

/// Builds the document corpus and its index-aligned vectors.
///
/// Documents are processed in source-row order; that order determines
/// tie-breaks in search results. The recognizer, when present, is called
/// once per row with a non-empty image address, and every failure is
/// contained to that row.
pub struct CorpusBuilder<'a> {
    vectorizer: &'a TextVectorizer,
    recognizer: Option<&'a dyn ArtifactRecognizer>,
    recognition_timeout: Duration,
}

impl<'a> CorpusBuilder<'a> {
    #[must_use]
    pub fn new(vectorizer: &'a TextVectorizer) -> Self {
        Self {
            vectorizer,
            recognizer: None,
            recognition_timeout: Duration::ZERO,
        }
    }

    /// Enrich documents with recognition metadata during the build.
    ///
    /// `timeout` bounds each recognizer call and is forwarded verbatim.
    #[must_use]
    pub fn with_recognizer(
        mut self,
        recognizer: &'a dyn ArtifactRecognizer,
        timeout: Duration,
    ) -> Self {
        self.recognizer = Some(recognizer);
        self.recognition_timeout = timeout;
        self
    }

    /// Build documents and vectors from source rows.
    ///
    /// Rows whose composed content is empty are excluded. The returned
    /// lists are position-aligned: document *i* owns vector *i*.
    #[must_use]
    pub fn build(&self, rows: &[SourceRow]) -> (Vec<Document>, Vec<Vec<f32>>) {
        let mut documents = Vec::new();
        let mut vectors = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            if row.is_blank() {
                debug!(row = row_index, "skipping blank source row");
                continue;
            }

            let recognition = self.recognize_row(row_index, row);
            let content = compose_content(row, recognition.as_ref());
            if content.is_empty() {
                debug!(row = row_index, "skipping row with empty content");
                continue;
            }

            let vector = self.vectorizer.vectorize(&content).into_vec();
            // Only possible if the configured dimension itself is zero
            if vector.is_empty() {
                warn!(row = row_index, "dropping document with zero-size vector");
                continue;
            }

            documents.push(Document {
                content,
                metadata: DocumentMetadata {
                    artifact_name: row.artifact_name.clone(),
                    image_url: row.image_url.clone(),
                    number_period: row.number_period.clone(),
                    history: row.history.clone(),
                    craft: row.craft.clone(),
                    source_row_index: row_index,
                    recognition_result: recognition,
                },
            });
            vectors.push(vector);

            if documents.len() % 1000 == 0 {
                info!(
                    processed = documents.len(),
                    total = rows.len(),
                    "building corpus"
                );
            }
        }

        info!(
            documents = documents.len(),
            rows = rows.len(),
            "corpus build complete"
        );
        (documents, vectors)
    }

    fn recognize_row(&self, row_index: usize, row: &SourceRow) -> Option<RecognitionResult> {
        let recognizer = self.recognizer?;
        if row.image_url.is_empty() {
            return Some(RecognitionResult::placeholder());
        }
        match recognizer.recognize(&row.image_url, self.recognition_timeout) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(row = row_index, error = %e, "image recognition failed, using placeholder");
                Some(RecognitionResult::failed(format!("识别失败: {e}")))
            }
        }
    }
}

/// Compose the labelled content text for one row.
///
/// Present, non-empty fields appear as `"<label>：<value>"` lines in fixed
/// order; recognition lines are appended only when their value is real,
/// not a placeholder.
#[must_use]
pub fn compose_content(row: &SourceRow, recognition: Option<&RecognitionResult>) -> String {
    let mut parts = Vec::new();
    if !row.artifact_name.is_empty() {
        parts.push(format!("{LABEL_ARTIFACT_NAME}：{}", row.artifact_name));
    }
    if !row.number_period.is_empty() {
        parts.push(format!("{LABEL_NUMBER_PERIOD}：{}", row.number_period));
    }
    if !row.history.is_empty() {
        parts.push(format!("{LABEL_HISTORY}：{}", row.history));
    }
    if !row.craft.is_empty() {
        parts.push(format!("{LABEL_CRAFT}：{}", row.craft));
    }

    if let Some(rec) = recognition {
        if !rec.type_is_placeholder() {
            parts.push(format!("{LABEL_RECOGNIZED_TYPE}：{}", rec.artifact_type));
        }
        if !rec.name_is_placeholder() {
            parts.push(format!("{LABEL_RECOGNIZED_NAME}：{}", rec.recognized_name));
        }
        if !rec.description_is_placeholder() {
            parts.push(format!("{LABEL_RECOGNIZED_DESC}：{}", rec.description));
        }
    }

    parts.join("\n")
}
