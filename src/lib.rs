//! Semantic retrieval over a museum artifact catalog.
//!
//! The crate turns a tabular catalog export into a searchable corpus:
//! Chinese text is segmented and embedded through a pretrained word-vector
//! table, indexed in an exact L2 index, and persisted next to its document
//! list. Search comes in two flavors: plain vector ranking, and a hybrid
//! mode that blends vector similarity with token overlap against image
//! recognition metadata.
//!
//! # Quick start
//!
//! ```no_run
//! use relicdex::{RetrievalEngine, Settings};
//!
//! # fn main() -> Result<(), relicdex::RetrievalError> {
//! let engine = RetrievalEngine::new(Settings::load()?)?;
//! engine.build(false)?;
//! let results = engine.search_normal("商代青铜器", 5)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod segment;
pub mod store;
pub mod types;

pub use config::Settings;
pub use corpus::{ArtifactRecognizer, Document, DocumentMetadata, RecognitionResult};
pub use engine::{RetrievalEngine, SearchResult};
pub use error::{RetrievalError, RetrievalResult};
pub use index::FlatIndex;
pub use segment::Segmenter;
pub use types::{Score, VectorDimension};
