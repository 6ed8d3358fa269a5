//! Type-safe wrappers and core types for the vector stage.
//!
//! Newtypes keep cluster indices and dimensions from being confused with
//! plain integers as they travel from the clusterer into the graph builder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension produced by the local "Universal Sentence Encoder" simulation.
pub const VECTOR_DIMENSION_512: usize = 512;

/// Dimension produced by the local "Sentence-BERT" simulation.
pub const VECTOR_DIMENSION_768: usize = 768;

/// Embedding sizes commonly produced by real providers.
///
/// Anything else is accepted but logged as unusual during validation.
const COMMON_DIMENSIONS: [usize; 6] = [384, 512, 768, 1024, 1536, 3072];

/// Index of a discovered cluster.
///
/// Cluster ids are 0-based and contiguous: a run that discovers `k` clusters
/// uses exactly the ids `0..k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u32);

impl ClusterId {
    /// Creates a new `ClusterId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Creates a `ClusterId` from a centroid index.
    ///
    /// # Panics
    /// Panics if the index does not fit in a u32, which cannot happen for
    /// the clamped cluster counts used by the clusterer.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("cluster index exceeds u32"))
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the id as a slice index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent silent
/// mismatches during comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates the 512-dimensional size used by the default local model.
    #[must_use]
    pub const fn dimension_512() -> Self {
        Self(VECTOR_DIMENSION_512)
    }

    /// Creates the 768-dimensional size used by the Sentence-BERT simulation.
    #[must_use]
    pub const fn dimension_768() -> Self {
        Self(VECTOR_DIMENSION_768)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Whether this is one of the sizes real embedding providers emit.
    #[must_use]
    pub fn is_common(&self) -> bool {
        COMMON_DIMENSIONS.contains(&self.0)
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Vector contains non-finite values (NaN or Infinity)\nSuggestion: Check the embedding provider output"
    )]
    NonFinite,

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),
}
