//! Vector stage of the knowledge-graph pipeline.
//!
//! This module turns embedding vectors into cluster assignments and a 2D
//! layout for visualization.
//!
//! # Working-set caps
//! - Distance: first 50 dimensions
//! - K-means: first 5 dimensions
//! - Silhouette: first 200 points, first 10 dimensions
//!
//! The caps keep every stage interactive on moderate document sets; none of
//! them is intended for batch analytics.

mod clustering;
pub mod math;
mod projection;
mod types;

// Re-export core types for public API
pub use clustering::{
    Clustering, ClusteringError, DEFAULT_MAX_ITERATIONS, DEFAULT_PARALLEL_THRESHOLD, KMeansOptions,
    KMeansResult, MAX_EXPLICIT_CLUSTERS, cluster, cluster_with, silhouette,
};
pub use projection::{fallback_layout, project_2d};
pub use types::{ClusterId, VectorDimension, VectorError};
