//! Text stages of the pipeline and the orchestrator that chains them.
//!
//! - [`chunking`]: documents to structured chunks
//! - [`embedding`]: chunks to vectors, plus keyword extraction
//! - [`validation`]: record checks between stages
//! - orchestration: [`Pipeline`] runs everything end to end

pub mod cache;
pub mod chunking;
pub mod embedding;
mod orchestrator;
pub mod validation;

pub use cache::{DEFAULT_CACHE_CAPACITY, ResponseCache};
pub use chunking::{Chunker, EntityTag, calculate_hash, chunk_documents, identify_entity};
pub use embedding::{
    EmbeddingGenerator, LocalTfIdfGenerator, assign_keywords, embed_chunks, extract_keywords,
    tokenize,
};
pub use orchestrator::{
    ClusterLayout, Pipeline, PipelineRun, PipelineStage, StageEvent, StageTiming,
};
pub use validation::{ValidationError, ValidationReport, validate_graph, validate_pipeline_integrity};
