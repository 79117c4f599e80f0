//! Brute-force squared-L2 index with a binary on-disk artifact.
//!
//! The index is exact: a k-NN query scans every stored vector. It is built
//! once per corpus rebuild from the full in-memory batch and never mutated
//! incrementally.
//!
//! # Artifact format
//!
//! - Header (16 bytes): magic `RVEC`, format version, dimension, vector count
//! - Payload: contiguous f32 vectors in little-endian, insertion order

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::MmapOptions;

use crate::index::IndexError;
use crate::types::VectorDimension;

/// Current artifact format version.
const FORMAT_VERSION: u32 = 1;

/// Size of the artifact header in bytes.
const HEADER_SIZE: usize = 16;

/// Magic bytes identifying index artifacts.
const MAGIC_BYTES: &[u8; 4] = b"RVEC";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// One k-NN result slot.
///
/// `position` is the zero-based insertion position of the matched vector,
/// or -1 for filler slots when k exceeds the corpus size. Callers must
/// filter fillers before dereferencing positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub distance: f32,
    pub position: i64,
}

/// Exact squared-Euclidean-distance index over a flat vector batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: VectorDimension,
    /// All vectors, concatenated in insertion order.
    data: Vec<f32>,
    count: usize,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            count: 0,
        }
    }

    /// Build an index from a full vector batch in one shot.
    pub fn from_batch(
        dimension: VectorDimension,
        vectors: &[Vec<f32>],
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(dimension);
        index.add_batch(vectors)?;
        Ok(index)
    }

    /// Append a batch of vectors, preserving order.
    ///
    /// Every vector must match the index dimension.
    pub fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        let dim = self.dimension.get();
        for vector in vectors {
            if vector.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    actual: vector.len(),
                });
            }
        }
        self.data.reserve(vectors.len() * dim);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        self.count += vectors.len();
        Ok(())
    }

    /// Number of indexed vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Vector dimension of the index.
    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    /// The stored vector at an insertion position.
    #[must_use]
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count {
            return None;
        }
        let dim = self.dimension.get();
        Some(&self.data[position * dim..(position + 1) * dim])
    }

    /// Find the k nearest vectors by squared L2 distance.
    ///
    /// Results are ordered by ascending distance, ties broken by ascending
    /// position. When k exceeds the corpus size, the shortfall is padded
    /// with `position = -1` filler slots.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let dim = self.dimension.get();
        if query.len() != dim {
            return Err(IndexError::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = (0..self.count)
            .map(|position| {
                let start = position * dim;
                let vector = &self.data[start..start + dim];
                let distance = squared_l2(query, vector);
                SearchHit {
                    distance,
                    position: position as i64,
                }
            })
            .collect();

        // Stable sort keeps insertion order for equal distances
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        while hits.len() < k {
            hits.push(SearchHit {
                distance: f32::MAX,
                position: -1,
            });
        }

        Ok(hits)
    }

    /// Write the index artifact to a writer.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), IndexError> {
        writer.write_all(MAGIC_BYTES)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.dimension.get() as u32).to_le_bytes())?;
        writer.write_all(&(self.count as u32).to_le_bytes())?;
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read an index artifact from disk.
    ///
    /// The file is memory-mapped and fully validated: bad magic, version,
    /// or a payload size that disagrees with the header all fail.
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        if mmap.len() < HEADER_SIZE {
            return Err(IndexError::InvalidFormat(
                "file too small to contain header".to_string(),
            ));
        }
        if &mmap[0..4] != MAGIC_BYTES {
            return Err(IndexError::InvalidFormat("invalid magic bytes".to_string()));
        }

        let version = u32::from_le_bytes([mmap[4], mmap[5], mmap[6], mmap[7]]);
        if version != FORMAT_VERSION {
            return Err(IndexError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: version,
            });
        }

        let dim_value = u32::from_le_bytes([mmap[8], mmap[9], mmap[10], mmap[11]]) as usize;
        let dimension = VectorDimension::new(dim_value)
            .map_err(|e| IndexError::InvalidFormat(e.to_string()))?;
        let count = u32::from_le_bytes([mmap[12], mmap[13], mmap[14], mmap[15]]) as usize;

        let expected_len = HEADER_SIZE + count * dim_value * BYTES_PER_F32;
        if mmap.len() != expected_len {
            return Err(IndexError::InvalidFormat(format!(
                "payload size mismatch: expected {expected_len} bytes, found {}",
                mmap.len()
            )));
        }

        let mut data = Vec::with_capacity(count * dim_value);
        for chunk in mmap[HEADER_SIZE..].chunks_exact(BYTES_PER_F32) {
            data.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        Ok(Self {
            dimension,
            data,
            count,
        })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
