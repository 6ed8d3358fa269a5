//! Structural checks on the records passed between pipeline stages.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::graph::GraphData;
use crate::types::{ClusterPoint, DocumentChunk, EmbeddingVector};
use crate::vector::VectorDimension;

/// Longest chunk content accepted, in characters.
pub const MAX_CHUNK_CONTENT_CHARS: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{record} has an empty or missing '{field}'")]
    EmptyField {
        record: &'static str,
        field: &'static str,
    },

    #[error("Chunk '{id}' has {length} characters, more than the {max} allowed")]
    ChunkTooLarge { id: String, length: usize, max: usize },

    #[error("Embedding '{id}' contains NaN or infinite values")]
    NonFiniteVector { id: String },

    #[error("Embedding '{id}' is a zero vector")]
    ZeroVector { id: String },

    #[error("Cluster point '{id}' has no cluster assigned")]
    UnassignedPoint { id: String },

    #[error("{record} '{id}' has a non-finite '{field}'")]
    NonFinite {
        record: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Node id '{id}' appears more than once")]
    DuplicateNode { id: String },

    #[error("Link {index} references unknown {end} node '{id}'")]
    DanglingLink {
        index: usize,
        end: &'static str,
        id: String,
    },

    #[error("Link {index} has value {value}, expected a number in [0, 1]")]
    LinkValueOutOfRange { index: usize, value: f32 },

    #[error("Graph metric '{metric}' is out of range: {value}")]
    MetricOutOfRange { metric: &'static str, value: f32 },

    #[error("Pipeline integrity check failed: {}", errors.join("; "))]
    Integrity { errors: Vec<String> },
}

/// Outcome of validating a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: usize,
    pub invalid: usize,
    /// One message per invalid record, prefixed with its position and id
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid == 0
    }

    fn record(&mut self, kind: &str, index: usize, id: &str, result: Result<(), ValidationError>) {
        match result {
            Ok(()) => self.valid += 1,
            Err(e) => {
                self.invalid += 1;
                self.errors.push(format!("{kind} {index} ({id}): {e}"));
            }
        }
    }
}

pub fn validate_chunk(chunk: &DocumentChunk) -> Result<(), ValidationError> {
    if chunk.id.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Chunk",
            field: "id",
        });
    }
    if chunk.content.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Chunk",
            field: "content",
        });
    }
    let length = chunk.content.chars().count();
    if length > MAX_CHUNK_CONTENT_CHARS {
        return Err(ValidationError::ChunkTooLarge {
            id: chunk.id.clone(),
            length,
            max: MAX_CHUNK_CONTENT_CHARS,
        });
    }
    if chunk.source.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Chunk",
            field: "source",
        });
    }
    if chunk.entity_type.as_deref().is_none_or(str::is_empty) {
        return Err(ValidationError::EmptyField {
            record: "Chunk",
            field: "entityType",
        });
    }
    Ok(())
}

/// Checks an embedding record.
///
/// A dimension outside the common model sizes is logged, not rejected.
pub fn validate_embedding(embedding: &EmbeddingVector) -> Result<(), ValidationError> {
    if embedding.id.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Embedding",
            field: "id",
        });
    }
    let dimension =
        VectorDimension::new(embedding.vector.len()).map_err(|_| ValidationError::EmptyField {
            record: "Embedding",
            field: "vector",
        })?;
    if !dimension.is_common() {
        tracing::warn!(
            id = %embedding.id,
            dimension = dimension.get(),
            "unusual embedding dimension"
        );
    }

    if embedding.vector.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteVector {
            id: embedding.id.clone(),
        });
    }
    let norm_sq: f32 = embedding.vector.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return Err(ValidationError::ZeroVector {
            id: embedding.id.clone(),
        });
    }
    if embedding.model_used.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Embedding",
            field: "modelUsed",
        });
    }
    Ok(())
}

pub fn validate_cluster_point(point: &ClusterPoint) -> Result<(), ValidationError> {
    if point.id.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Cluster point",
            field: "id",
        });
    }
    if point.cluster_id.is_none() {
        return Err(ValidationError::UnassignedPoint {
            id: point.id.clone(),
        });
    }
    if point.label.is_empty() {
        return Err(ValidationError::EmptyField {
            record: "Cluster point",
            field: "label",
        });
    }
    for (field, value) in [("x", point.x), ("y", point.y)] {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite {
                record: "Cluster point",
                id: point.id.clone(),
                field,
            });
        }
    }
    Ok(())
}

pub fn validate_graph(graph: &GraphData) -> Result<(), ValidationError> {
    if graph.nodes.is_empty() {
        return Err(ValidationError::EmptyGraph);
    }

    for node in &graph.nodes {
        if node.id.is_empty() {
            return Err(ValidationError::EmptyField {
                record: "Node",
                field: "id",
            });
        }
        if node.label.is_empty() {
            return Err(ValidationError::EmptyField {
                record: "Node",
                field: "label",
            });
        }
        if !node.centrality.is_finite() {
            return Err(ValidationError::NonFinite {
                record: "Node",
                id: node.id.clone(),
                field: "centrality",
            });
        }
    }

    let mut ids: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }
    for (index, link) in graph.links.iter().enumerate() {
        for (end, id) in [("source", &link.source), ("target", &link.target)] {
            if !ids.contains(id.as_str()) {
                return Err(ValidationError::DanglingLink {
                    index,
                    end,
                    id: id.clone(),
                });
            }
        }
        if !(0.0..=1.0).contains(&link.value) {
            return Err(ValidationError::LinkValueOutOfRange {
                index,
                value: link.value,
            });
        }
    }

    let metrics = &graph.metrics;
    if !(0.0..=1.0).contains(&metrics.density) {
        return Err(ValidationError::MetricOutOfRange {
            metric: "density",
            value: metrics.density,
        });
    }
    if metrics.avg_degree.is_nan() || metrics.avg_degree < 0.0 {
        return Err(ValidationError::MetricOutOfRange {
            metric: "avgDegree",
            value: metrics.avg_degree,
        });
    }
    Ok(())
}

pub fn validate_chunks(chunks: &[DocumentChunk]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (index, chunk) in chunks.iter().enumerate() {
        report.record("Chunk", index, &chunk.id, validate_chunk(chunk));
    }
    report
}

pub fn validate_embeddings(embeddings: &[EmbeddingVector]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (index, embedding) in embeddings.iter().enumerate() {
        report.record("Embedding", index, &embedding.id, validate_embedding(embedding));
    }
    report
}

pub fn validate_cluster_points(points: &[ClusterPoint]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (index, point) in points.iter().enumerate() {
        report.record("Cluster point", index, &point.id, validate_cluster_point(point));
    }
    report
}

/// Ids seen more than once, in first-repeat order.
fn duplicate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for id in ids {
        if !seen.insert(id) && !repeated.contains(&id) {
            repeated.push(id);
        }
    }
    repeated
}

/// Checks that ids are unique and that every embedding and cluster point
/// traces back to a chunk.
pub fn validate_pipeline_integrity(
    chunks: &[DocumentChunk],
    embeddings: &[EmbeddingVector],
    points: Option<&[ClusterPoint]>,
) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if chunks.len() != embeddings.len() {
        errors.push(format!(
            "{} chunks but {} embeddings",
            chunks.len(),
            embeddings.len()
        ));
    }

    for id in duplicate_ids(chunks.iter().map(|c| c.id.as_str())) {
        errors.push(format!("chunk id '{id}' is not unique"));
    }
    for id in duplicate_ids(embeddings.iter().map(|e| e.id.as_str())) {
        errors.push(format!("embedding id '{id}' is not unique"));
    }

    let chunk_ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    for embedding in embeddings {
        if !chunk_ids.contains(embedding.id.as_str()) {
            errors.push(format!("embedding '{}' has no matching chunk", embedding.id));
        }
    }
    for point in points.unwrap_or_default() {
        if !chunk_ids.contains(point.id.as_str()) {
            errors.push(format!("cluster point '{}' has no matching chunk", point.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Integrity { errors })
    }
}
