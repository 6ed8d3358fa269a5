//! Graph stage: cluster points in, weighted knowledge graph out.
//!
//! Edges come from two sources:
//! - shared keywords, found through an inverted index so only pairs that
//!   co-occur in a bucket are ever scored
//! - membership in the same cluster
//!
//! Both feed one [`EdgeMap`], which keeps a single edge per node pair.

pub mod analysis;
mod builder;
pub mod keywords;
pub mod metrics;
mod types;

pub use analysis::{ClusterProfile, ClusterSimilarity, KeywordCount, cluster_profiles, cluster_similarities};
pub use builder::{
    EdgeEvidence, EdgeMap, GraphBuilder, RETAIN_THRESHOLD, SEMANTIC_CREATE_THRESHOLD,
    STOPWORD_SHARE, build_graph,
};
pub use types::{EdgeKind, GraphData, GraphLink, GraphMetrics, GraphNode, UNCLUSTERED_GROUP};
