//! Text-to-vector conversion with an explicit degraded fallback.

use std::sync::Arc;

use tracing::warn;

use crate::embedding::EmbeddingTable;
use crate::segment::Segmenter;
use crate::types::VectorDimension;

/// Outcome of vectorizing a text.
///
/// Both variants carry a vector of the configured dimension, so the public
/// search path always has something to index or query with. `Degraded`
/// marks the all-zero fallback, produced when no token resolved or no table
/// is loaded, which callers and tests can distinguish from a real
/// embedding. Degraded documents cluster falsely near each other; that is
/// the cost of keeping every document representable.
#[derive(Debug, Clone, PartialEq)]
pub enum TextVector {
    /// Mean of at least one matched token vector.
    Embedded(Vec<f32>),
    /// All-zero fallback of the configured dimension.
    Degraded(Vec<f32>),
}

impl TextVector {
    /// The vector, regardless of how it was produced.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        match self {
            Self::Embedded(v) | Self::Degraded(v) => v,
        }
    }

    /// Consume into the inner vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        match self {
            Self::Embedded(v) | Self::Degraded(v) => v,
        }
    }

    /// True when this is the zero-vector fallback.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Converts text into a fixed-dimension vector via the embedding table.
///
/// The table is optional: when the pretrained model failed to load, every
/// vectorization degrades to the zero vector rather than raising. Search
/// keeps working with degraded quality instead of failing.
#[derive(Debug, Clone)]
pub struct TextVectorizer {
    table: Option<Arc<EmbeddingTable>>,
    segmenter: Arc<Segmenter>,
    dimension: VectorDimension,
}

impl TextVectorizer {
    /// Create a vectorizer over a loaded table.
    #[must_use]
    pub fn new(table: Arc<EmbeddingTable>, segmenter: Arc<Segmenter>) -> Self {
        let dimension = table.dimension();
        Self {
            table: Some(table),
            segmenter,
            dimension,
        }
    }

    /// Create a vectorizer with no table: every result is `Degraded`.
    ///
    /// `dimension` fixes the size of the zero vectors so downstream index
    /// construction still sees consistent shapes.
    #[must_use]
    pub fn degraded(segmenter: Arc<Segmenter>, dimension: VectorDimension) -> Self {
        warn!(
            dimension = dimension.get(),
            "embedding table unavailable; all vectorization degrades to the zero vector"
        );
        Self {
            table: None,
            segmenter,
            dimension,
        }
    }

    /// Vector dimension of every produced vector.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// True when no embedding table is loaded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.table.is_none()
    }

    /// Vectorize a text: tokenize, look up, drop misses, average.
    ///
    /// Never fails and never produces a dimension mismatch. Zero matched
    /// tokens yield `Degraded(zero vector)`.
    #[must_use]
    pub fn vectorize(&self, text: &str) -> TextVector {
        let dim = self.dimension.get();
        let Some(table) = &self.table else {
            return TextVector::Degraded(vec![0.0; dim]);
        };

        let tokens = self.segmenter.cut(text);
        let mut sum = vec![0.0f32; dim];
        let mut matched = 0usize;
        for token in &tokens {
            if let Some(vector) = table.lookup(token) {
                for (acc, v) in sum.iter_mut().zip(vector) {
                    *acc += v;
                }
                matched += 1;
            }
        }

        if matched == 0 {
            return TextVector::Degraded(sum);
        }

        let count = matched as f32;
        for v in &mut sum {
            *v /= count;
        }
        TextVector::Embedded(sum)
    }
}
