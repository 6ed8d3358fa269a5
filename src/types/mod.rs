//! Records that flow between pipeline stages.
//!
//! Every record serializes with camelCase field names so JSON exchanged with
//! external collaborators (embedding providers, visualizers, exporters)
//! keeps the same shape on both sides.

use crate::vector::ClusterId;
use serde::{Deserialize, Serialize};

/// Raw text of one input document, after extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name or other stable source label
    pub name: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A contiguous span of source text treated as one embedding unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub id: String,
    /// Name of the document this chunk came from
    pub source: String,
    pub content: String,
    /// Whitespace-separated word count
    pub tokens: usize,
    /// Structural kind, e.g. `ARTIGO`, `CAPITULO`, `FRAGMENTO_TEXTO`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Human-readable label, e.g. `Art. 1º`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// SHA-256 of `content`, hex encoded
    pub hash: String,
}

/// Embedding of one chunk plus the descriptive fields carried downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingVector {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub full_content: String,
    #[serde(default)]
    pub model_used: String,
}

impl EmbeddingVector {
    /// Builds the embedding record for `chunk`.
    pub fn from_chunk(chunk: &DocumentChunk, vector: Vec<f32>, model_used: &str) -> Self {
        Self {
            id: chunk.id.clone(),
            vector,
            entity_type: chunk.entity_type.clone(),
            entity_label: chunk.entity_label.clone(),
            keywords: chunk.keywords.clone(),
            full_content: chunk.content.clone(),
            model_used: model_used.to_string(),
        }
    }
}

/// An embedding placed on the 2D canvas and assigned to a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPoint {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    /// `None` marks a point with no cluster assigned
    pub cluster_id: Option<ClusterId>,
    #[serde(default)]
    pub full_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_label: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ClusterPoint {
    /// Places `embedding` (the `index`-th input) at `position` in `cluster_id`.
    ///
    /// The label falls back to `Chunk {index}` when the embedding has no
    /// entity label.
    pub fn from_embedding(
        embedding: &EmbeddingVector,
        index: usize,
        position: (f32, f32),
        cluster_id: Option<ClusterId>,
    ) -> Self {
        Self {
            id: embedding.id.clone(),
            label: embedding
                .entity_label
                .clone()
                .unwrap_or_else(|| format!("Chunk {index}")),
            x: position.0,
            y: position.1,
            cluster_id,
            full_content: embedding.full_content.clone(),
            entity_type: embedding.entity_type.clone(),
            entity_label: embedding.entity_label.clone(),
            keywords: embedding.keywords.clone(),
        }
    }
}
