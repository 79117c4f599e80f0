//! Pretrained word-vector table in word2vec text format.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::embedding::EmbeddingError;
use crate::types::VectorDimension;

/// In-memory token-to-vector table.
///
/// All vectors share one dimension, fixed by the first data line of the
/// table file. Unknown tokens simply miss; the table never substitutes.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
    dimension: VectorDimension,
}

impl EmbeddingTable {
    /// Load a table from a word2vec text file.
    ///
    /// Accepts the conventional optional header line ("<count> <dim>")
    /// followed by one "<token> <v1> ... <vD>" line per entry. Every data
    /// line must carry the same number of components.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EmbeddingError::TableRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let reader = BufReader::new(file);

        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
        let mut dimension: Option<VectorDimension> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| EmbeddingError::TableRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .expect("non-empty line has at least one field");
            let components: Vec<&str> = parts.collect();

            // Header line: "<count> <dim>" before any entries
            if dimension.is_none() && vectors.is_empty() && components.len() == 1 {
                if token.parse::<usize>().is_ok() {
                    if let Ok(dim) = components[0].parse::<usize>() {
                        dimension = Some(VectorDimension::new(dim)?);
                        continue;
                    }
                }
            }

            let values: Result<Vec<f32>, _> =
                components.iter().map(|c| c.parse::<f32>()).collect();
            let values = values.map_err(|e| EmbeddingError::MalformedTable {
                path: path.to_path_buf(),
                line: line_no + 1,
                reason: format!("non-numeric vector component: {e}"),
            })?;

            match dimension {
                None => {
                    dimension = Some(VectorDimension::new(values.len()).map_err(|_| {
                        EmbeddingError::MalformedTable {
                            path: path.to_path_buf(),
                            line: line_no + 1,
                            reason: "entry has no vector components".to_string(),
                        }
                    })?);
                }
                Some(dim) => {
                    if values.len() != dim.get() {
                        return Err(EmbeddingError::MalformedTable {
                            path: path.to_path_buf(),
                            line: line_no + 1,
                            reason: format!(
                                "expected {} components, got {}",
                                dim.get(),
                                values.len()
                            ),
                        });
                    }
                }
            }

            vectors.insert(token.to_string(), values);
        }

        let dimension = dimension.ok_or_else(|| EmbeddingError::EmptyTable {
            path: path.to_path_buf(),
        })?;
        if vectors.is_empty() {
            return Err(EmbeddingError::EmptyTable {
                path: path.to_path_buf(),
            });
        }

        info!(
            tokens = vectors.len(),
            dimension = dimension.get(),
            "loaded embedding table"
        );

        Ok(Self { vectors, dimension })
    }

    /// Build a table directly from (token, vector) pairs.
    ///
    /// All vectors must match the given dimension. Used by callers that
    /// already hold vectors in memory, and by tests.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, Vec<f32>)>,
        dimension: VectorDimension,
    ) -> Result<Self, EmbeddingError> {
        let mut vectors = HashMap::new();
        for (token, vector) in pairs {
            dimension.validate_vector(&vector)?;
            vectors.insert(token, vector);
        }
        Ok(Self { vectors, dimension })
    }

    /// Look up the vector for a token. Unknown tokens return `None`.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    /// Number of tokens in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension shared by every vector in the table.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
