//! Knowledge graphs from unstructured text.
//!
//! Documents are chunked, embedded, clustered with K-Means, projected to a 2D
//! canvas and joined into a weighted similarity graph. The numeric core lives
//! in [`vector`] and [`graph`]; [`pipeline::Pipeline`] chains the stages.

pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{ErrorContext, PipelineError, PipelineResult};
pub use graph::{EdgeKind, GraphBuilder, GraphData, GraphLink, GraphMetrics, GraphNode, build_graph};
pub use pipeline::{Pipeline, PipelineRun, PipelineStage};
pub use types::{ClusterPoint, DocumentChunk, EmbeddingVector, SourceDocument};
pub use vector::{ClusterId, Clustering, ClusteringError, VectorError, cluster, project_2d, silhouette};
