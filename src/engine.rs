//! Engine facade: build orchestration and the two search paths.
//!
//! The engine owns the vectorizer, the segmenter, and the artifact store.
//! `build` turns the tabular catalog source into the persisted corpus;
//! `search_normal` ranks by vector distance alone, and `search_enhanced`
//! blends that with a token-overlap signal against image recognition
//! metadata.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::corpus::{ArtifactRecognizer, CorpusBuilder, DocumentMetadata, read_source};
use crate::embedding::{EmbeddingTable, TextVectorizer};
use crate::error::{RetrievalError, RetrievalResult};
use crate::index::FlatIndex;
use crate::segment::Segmenter;
use crate::store::{CorpusSnapshot, IndexStore};
use crate::types::{Score, VectorDimension};

/// Candidate pool multiplier for enhanced search.
///
/// Rescoring can only promote documents already in the pool, so enhanced
/// search retrieves a wider slice before blending.
const CANDIDATE_MULTIPLIER: usize = 3;

/// One ranked search result, shaped for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Final ranking score in [0, 1].
    pub score: f32,
    /// Vector-similarity component, present only for enhanced search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f32>,
    /// Image-overlap component, present only for enhanced search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_score: Option<f32>,
}

/// The retrieval engine over one catalog corpus.
pub struct RetrievalEngine {
    settings: Settings,
    segmenter: Arc<Segmenter>,
    vectorizer: TextVectorizer,
    store: IndexStore,
    recognizer: Option<Box<dyn ArtifactRecognizer>>,
}

impl RetrievalEngine {
    /// Create an engine from settings.
    ///
    /// The embedding table is loaded eagerly. A missing or unreadable table
    /// is not fatal: the engine degrades to zero-vector mode and keeps
    /// serving, with reduced quality.
    pub fn new(settings: Settings) -> RetrievalResult<Self> {
        let segmenter = Arc::new(Segmenter::new());
        let dimension = VectorDimension::new(settings.embedding.dimension)
            .map_err(|e| RetrievalError::ConfigError {
                reason: e.to_string(),
            })?;

        let vectorizer = match &settings.embedding.table_path {
            Some(path) => match EmbeddingTable::load(path) {
                Ok(table) => {
                    if table.dimension() != dimension {
                        warn!(
                            configured = dimension.get(),
                            table = table.dimension().get(),
                            "configured dimension differs from table, using the table's"
                        );
                    }
                    TextVectorizer::new(Arc::new(table), Arc::clone(&segmenter))
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "embedding table failed to load, running degraded");
                    TextVectorizer::degraded(Arc::clone(&segmenter), dimension)
                }
            },
            None => TextVectorizer::degraded(Arc::clone(&segmenter), dimension),
        };

        let store = IndexStore::new(&settings.data_dir);
        Ok(Self {
            settings,
            segmenter,
            vectorizer,
            store,
            recognizer: None,
        })
    }

    /// Attach an image recognizer for corpus builds.
    ///
    /// The recognizer is only called when `recognition.enabled` is set in
    /// the settings; each call is bounded by `recognition.timeout_secs`.
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn ArtifactRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True when a non-empty corpus is installed and searchable.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Number of searchable documents.
    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.store.snapshot().map_or(0, |s| s.len())
    }

    /// True when both corpus artifacts exist on disk.
    #[must_use]
    pub fn artifacts_exist(&self) -> bool {
        self.store.artifacts_exist()
    }

    /// Try to load persisted artifacts without touching the source file.
    ///
    /// Returns `true` when a usable corpus was installed.
    pub fn load(&self) -> bool {
        self.store.load()
    }

    /// Build or load the corpus.
    ///
    /// Without `force_rebuild`, existing artifacts are loaded instead of
    /// rebuilding, so repeated builds over an unchanged source are
    /// idempotent. With it, the artifacts are deleted first and the corpus
    /// is rebuilt from the source file.
    ///
    /// Returns `true` when a rebuild happened, `false` when artifacts were
    /// loaded as-is.
    pub fn build(&self, force_rebuild: bool) -> RetrievalResult<bool> {
        if force_rebuild {
            info!("forced rebuild requested, clearing existing artifacts");
            self.store.clear_artifacts()?;
        } else if self.store.artifacts_exist() {
            if self.store.load() {
                return Ok(false);
            }
            warn!("existing artifacts were unusable, rebuilding from source");
        }

        let rows = read_source(&self.settings.source_path)?;
        let mut builder = CorpusBuilder::new(&self.vectorizer);
        if self.settings.recognition.enabled {
            match self.recognizer.as_deref() {
                Some(recognizer) => {
                    builder = builder.with_recognizer(
                        recognizer,
                        Duration::from_secs(self.settings.recognition.timeout_secs),
                    );
                }
                None => {
                    warn!("recognition is enabled but no recognizer is attached, building without it");
                }
            }
        } else if self.recognizer.is_some() {
            info!("recognizer attached but recognition is disabled, building without it");
        }
        let (documents, vectors) = builder.build(&rows);

        let index = FlatIndex::from_batch(self.vectorizer.dimension(), &vectors)?;
        let snapshot = CorpusSnapshot { index, documents };
        self.store.persist(&snapshot)?;
        self.store.install(snapshot);

        info!(documents = self.corpus_size(), "corpus built and installed");
        Ok(true)
    }

    /// Plain vector search: top-k by ascending distance.
    ///
    /// Returns an empty list when no corpus is installed. Scores map the
    /// squared distance through 1/(1+d).
    pub fn search_normal(&self, query: &str, top_k: usize) -> RetrievalResult<Vec<SearchResult>> {
        let Some(snapshot) = self.store.snapshot().filter(|s| !s.is_empty()) else {
            debug!("search before corpus is ready, returning no results");
            return Ok(Vec::new());
        };

        let query_vector = self.vectorizer.vectorize(query);
        let hits = snapshot.index.search(query_vector.as_slice(), top_k)?;

        let results = hits
            .into_iter()
            .filter(|h| h.position >= 0)
            .map(|h| {
                let document = &snapshot.documents[h.position as usize];
                SearchResult {
                    content: document.content.clone(),
                    metadata: document.metadata.clone(),
                    score: Score::from_distance(h.distance).get(),
                    base_score: None,
                    image_score: None,
                }
            })
            .collect();
        Ok(results)
    }

    /// Hybrid search: vector similarity blended with image-recognition
    /// token overlap.
    ///
    /// A candidate pool of `min(3 * top_k, corpus)` nearest documents is
    /// rescored with `(1 - w) * base + w * image` and re-ranked. With
    /// `image_weight` of zero the ordering matches plain search over that
    /// wider pool. Ties keep ascending-distance order.
    pub fn search_enhanced(
        &self,
        query: &str,
        top_k: usize,
        image_weight: f32,
    ) -> RetrievalResult<Vec<SearchResult>> {
        if image_weight.is_nan() || !(0.0..=1.0).contains(&image_weight) {
            return Err(RetrievalError::ConfigError {
                reason: format!("image weight must be in [0, 1], got {image_weight}"),
            });
        }

        let Some(snapshot) = self.store.snapshot().filter(|s| !s.is_empty()) else {
            debug!("search before corpus is ready, returning no results");
            return Ok(Vec::new());
        };

        let candidate_k = (top_k * CANDIDATE_MULTIPLIER).min(snapshot.len());
        let query_vector = self.vectorizer.vectorize(query);
        let hits = snapshot.index.search(query_vector.as_slice(), candidate_k)?;

        let query_tokens = self.segmenter.token_set(&query.to_lowercase());

        let mut results = Vec::with_capacity(candidate_k);
        for hit in hits.into_iter().filter(|h| h.position >= 0) {
            let document = &snapshot.documents[hit.position as usize];
            let base = Score::from_distance(hit.distance);
            let image = self.image_overlap_score(&query_tokens, document.metadata.recognition_result.as_ref());
            let combined = base
                .weighted_combine(image, 1.0 - image_weight)
                .map_err(|e| RetrievalError::ConfigError {
                    reason: e.to_string(),
                })?;

            results.push(SearchResult {
                content: document.content.clone(),
                metadata: document.metadata.clone(),
                score: combined.get(),
                base_score: Some(base.get()),
                image_score: Some(image.get()),
            });
        }

        // Stable sort: equal blended scores keep ascending-distance order
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    /// Overlap signal between the query tokens and a document's recognition
    /// text, scaled by recognition confidence.
    ///
    /// `|q ∩ image| / max(|q|, 1)`, then scaled by `0.5 + 0.5 * confidence`,
    /// so a low-confidence recognition can contribute at most half of a
    /// confident one. Documents without recognition score zero.
    fn image_overlap_score(
        &self,
        query_tokens: &std::collections::HashSet<String>,
        recognition: Option<&crate::corpus::RecognitionResult>,
    ) -> Score {
        let Some(recognition) = recognition else {
            return Score::zero();
        };

        let image_tokens = self
            .segmenter
            .token_set(&recognition.image_text().to_lowercase());
        let overlap = query_tokens.intersection(&image_tokens).count() as f32;
        let ratio = overlap / query_tokens.len().max(1) as f32;
        let confidence = recognition.confidence.clamp(0.0, 1.0);
        let value = (ratio * (0.5 + 0.5 * confidence)).clamp(0.0, 1.0);
        Score::new(value).unwrap_or_else(|_| Score::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{RecognitionError, RecognitionResult};
    use tempfile::TempDir;

    // Table contains both composite words and their parts so assertions
    // hold regardless of how the segmenter splits a phrase.
    const TABLE: &str = "\
青铜 1.0 0.0 0.0
青铜鼎 1.0 0.0 0.0
青铜器 0.9 0.1 0.0
鼎 0.8 0.1 0.0
商代 0.7 0.2 0.0
玉璧 0.0 1.0 0.0
玉 0.0 0.9 0.0
璧 0.0 0.9 0.0
玉器 0.0 0.9 0.1
汉代 0.1 0.8 0.0
";

    const SOURCE: &str = "\
文物名称,图片地址,编号-年代,历史,工艺
青铜鼎,http://example.com/ding.jpg,商代,王室祭祀礼器,范铸
,,,,
玉璧,http://example.com/bi.jpg,汉代,墓葬出土礼玉,琢磨
";

    struct Fixture {
        _dir: TempDir,
        settings: Settings,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let table_path = dir.path().join("w2v.txt");
        std::fs::write(&table_path, TABLE).unwrap();
        let source_path = dir.path().join("catalog.csv");
        std::fs::write(&source_path, SOURCE).unwrap();

        let mut settings = Settings::default();
        settings.data_dir = dir.path().join("data");
        settings.source_path = source_path;
        settings.embedding.table_path = Some(table_path);
        settings.embedding.dimension = 3;
        Fixture {
            _dir: dir,
            settings,
        }
    }

    struct JadeRecognizer;

    impl ArtifactRecognizer for JadeRecognizer {
        fn recognize(
            &self,
            image_url: &str,
            _timeout: Duration,
        ) -> Result<RecognitionResult, RecognitionError> {
            if image_url.contains("bi.jpg") {
                Ok(RecognitionResult {
                    artifact_type: "玉器".to_string(),
                    recognized_name: "玉璧".to_string(),
                    confidence: 0.9,
                    description: "圆形玉制礼器".to_string(),
                })
            } else {
                Ok(RecognitionResult::placeholder())
            }
        }
    }

    #[test]
    fn test_search_before_build_is_empty() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();

        assert!(!engine.is_ready());
        assert!(engine.search_normal("青铜", 5).unwrap().is_empty());
        assert!(engine.search_enhanced("青铜", 5, 0.3).unwrap().is_empty());
    }

    #[test]
    fn test_build_and_plain_search() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();

        assert!(engine.build(false).unwrap());
        assert!(engine.is_ready());
        // Blank source row excluded
        assert_eq!(engine.corpus_size(), 2);

        let results = engine.search_normal("商代青铜器", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.artifact_name, "青铜鼎");
        assert!(results[0].score > results[1].score);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        assert!(results[0].base_score.is_none());
    }

    #[test]
    fn test_oversized_k_returns_whole_corpus() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();
        engine.build(false).unwrap();

        let results = engine.search_normal("玉璧", 50).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_second_build_loads_artifacts() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings.clone()).unwrap();
        assert!(engine.build(false).unwrap());

        let index_bytes = std::fs::read(fx.settings.data_dir.join("vectors.idx")).unwrap();
        let doc_bytes = std::fs::read(fx.settings.data_dir.join("documents.json")).unwrap();

        // A fresh engine over the same data dir loads instead of rebuilding
        let second = RetrievalEngine::new(fx.settings.clone()).unwrap();
        assert!(!second.build(false).unwrap());
        assert!(second.is_ready());

        // Artifacts are byte-identical after the no-op build
        assert_eq!(
            std::fs::read(fx.settings.data_dir.join("vectors.idx")).unwrap(),
            index_bytes
        );
        assert_eq!(
            std::fs::read(fx.settings.data_dir.join("documents.json")).unwrap(),
            doc_bytes
        );
    }

    #[test]
    fn test_force_rebuild_recreates_artifacts() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();
        engine.build(false).unwrap();
        assert!(engine.build(true).unwrap());
        assert!(engine.is_ready());
    }

    #[test]
    fn test_enhanced_search_boosts_recognition_overlap() {
        let fx = fixture();
        let mut settings = fx.settings;
        settings.recognition.enabled = true;
        let engine = RetrievalEngine::new(settings)
            .unwrap()
            .with_recognizer(Box::new(JadeRecognizer));
        engine.build(false).unwrap();

        let results = engine.search_enhanced("玉璧", 2, 0.3).unwrap();
        assert_eq!(results[0].metadata.artifact_name, "玉璧");

        let top = &results[0];
        let base = top.base_score.unwrap();
        let image = top.image_score.unwrap();
        // Query token 玉璧 appears in the recognition text with 0.9
        // confidence, so the overlap signal is real
        assert!(image > 0.0);
        // Blend sits strictly between the components
        assert!(top.score > base.min(image) && top.score < base.max(image));
        let expected = 0.7 * base + 0.3 * image;
        assert!((top.score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_enhanced_with_zero_weight_matches_plain_order() {
        let fx = fixture();
        let mut settings = fx.settings;
        settings.recognition.enabled = true;
        let engine = RetrievalEngine::new(settings)
            .unwrap()
            .with_recognizer(Box::new(JadeRecognizer));
        engine.build(false).unwrap();

        let plain = engine.search_normal("商代青铜器", 2).unwrap();
        let enhanced = engine.search_enhanced("商代青铜器", 2, 0.0).unwrap();

        let plain_names: Vec<_> = plain.iter().map(|r| &r.metadata.artifact_name).collect();
        let enhanced_names: Vec<_> =
            enhanced.iter().map(|r| &r.metadata.artifact_name).collect();
        assert_eq!(plain_names, enhanced_names);
        for (p, e) in plain.iter().zip(&enhanced) {
            assert!((p.score - e.score).abs() < 1e-6);
        }
    }

    #[test]
    fn test_disabled_recognition_skips_attached_recognizer() {
        let fx = fixture();
        // Recognizer attached, but recognition stays disabled in settings
        let engine = RetrievalEngine::new(fx.settings)
            .unwrap()
            .with_recognizer(Box::new(JadeRecognizer));
        engine.build(false).unwrap();

        let results = engine.search_normal("玉璧", 2).unwrap();
        assert!(results
            .iter()
            .all(|r| r.metadata.recognition_result.is_none()));
    }

    #[test]
    fn test_configured_timeout_reaches_recognizer() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct TimeoutRecorder(Rc<Cell<Option<Duration>>>);

        impl ArtifactRecognizer for TimeoutRecorder {
            fn recognize(
                &self,
                _image_url: &str,
                timeout: Duration,
            ) -> Result<RecognitionResult, RecognitionError> {
                self.0.set(Some(timeout));
                Ok(RecognitionResult::placeholder())
            }
        }

        let fx = fixture();
        let mut settings = fx.settings;
        settings.recognition.enabled = true;
        settings.recognition.timeout_secs = 7;

        let seen = Rc::new(Cell::new(None));
        let engine = RetrievalEngine::new(settings)
            .unwrap()
            .with_recognizer(Box::new(TimeoutRecorder(Rc::clone(&seen))));
        engine.build(false).unwrap();

        assert_eq!(seen.get(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_enhanced_without_recognition_has_zero_image_score() {
        let fx = fixture();
        // No recognizer configured at build time
        let engine = RetrievalEngine::new(fx.settings).unwrap();
        engine.build(false).unwrap();

        let results = engine.search_enhanced("玉璧", 2, 0.3).unwrap();
        assert!(results.iter().all(|r| r.image_score == Some(0.0)));
        // With zero image signal the blend just scales the base component
        for r in &results {
            let base = r.base_score.unwrap();
            assert!((r.score - 0.7 * base).abs() < 1e-6);
        }
    }

    #[test]
    fn test_invalid_image_weight_rejected() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();
        engine.build(false).unwrap();

        assert!(engine.search_enhanced("玉璧", 2, 1.5).is_err());
        assert!(engine.search_enhanced("玉璧", 2, -0.1).is_err());
        assert!(engine.search_enhanced("玉璧", 2, f32::NAN).is_err());
    }

    #[test]
    fn test_own_name_ranks_its_document_first() {
        let fx = fixture();
        let engine = RetrievalEngine::new(fx.settings).unwrap();
        engine.build(false).unwrap();

        let results = engine.search_normal("玉璧", 1).unwrap();
        assert_eq!(results[0].metadata.artifact_name, "玉璧");
    }

    #[test]
    fn test_missing_source_file_fails_build() {
        let fx = fixture();
        let mut settings = fx.settings;
        settings.source_path = settings.data_dir.join("missing.csv");
        let engine = RetrievalEngine::new(settings).unwrap();

        assert!(matches!(
            engine.build(false).unwrap_err(),
            RetrievalError::FileRead { .. }
        ));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_degraded_engine_builds_and_searches() {
        let fx = fixture();
        let mut settings = fx.settings;
        settings.embedding.table_path = Some(settings.data_dir.join("missing-table.txt"));
        settings.embedding.dimension = 3;
        let engine = RetrievalEngine::new(settings).unwrap();

        assert!(engine.build(false).unwrap());
        // Every vector degraded to zero: results exist but distances tie
        let results = engine.search_normal("青铜", 2).unwrap();
        assert_eq!(results.len(), 2);
        assert!((results[0].score - results[1].score).abs() < f32::EPSILON);
    }
}
