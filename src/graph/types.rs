//! Graph records emitted by the builder.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vector::MAX_EXPLICIT_CLUSTERS;

/// Group assigned to nodes whose point has no cluster. Clustering never
/// produces an id this large.
pub const UNCLUSTERED_GROUP: u32 = MAX_EXPLICIT_CLUSTERS as u32;

/// Semantic class of an edge.
///
/// Variants are declared in upgrade priority order: a merged edge may move
/// to a later variant but never back to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Same cluster, structural evidence only
    CoOccurrence,
    /// Shared keywords
    Semantic,
    /// Reserved for a parent/child classifier; no rule emits it yet.
    Hierarchical,
}

impl EdgeKind {
    /// The stronger of two kinds.
    #[must_use]
    pub fn upgrade(self, other: EdgeKind) -> EdgeKind {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::CoOccurrence => "co-occurrence",
            EdgeKind::Semantic => "semantic",
            EdgeKind::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Cluster id, or [`UNCLUSTERED_GROUP`]
    pub group: u32,
    /// `degree / (N - 1)`, in `[0, 1]`
    pub centrality: f32,
    #[serde(default)]
    pub full_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Undirected weighted edge, stored once per node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    /// Layout weight in `[0, 1]`
    pub value: f32,
    /// Strength of the evidence in `[0, 1]`
    pub confidence: f32,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub density: f32,
    pub avg_degree: f32,
    /// Within-group edge share minus `(1/N)^2`; a proxy, not Newman modularity
    pub modularity: f32,
    pub silhouette_score: f32,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub connected_components: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub metrics: GraphMetrics,
}

impl GraphData {
    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The stored edge between `a` and `b`, in either orientation.
    pub fn link_between(&self, a: &str, b: &str) -> Option<&GraphLink> {
        self.links.iter().find(|l| {
            (l.source == a && l.target == b) || (l.source == b && l.target == a)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_priority() {
        assert!(EdgeKind::CoOccurrence < EdgeKind::Semantic);
        assert!(EdgeKind::Semantic < EdgeKind::Hierarchical);
        assert_eq!(
            EdgeKind::Semantic.upgrade(EdgeKind::CoOccurrence),
            EdgeKind::Semantic
        );
        assert_eq!(
            EdgeKind::CoOccurrence.upgrade(EdgeKind::Semantic),
            EdgeKind::Semantic
        );
    }

    #[test]
    fn test_edge_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&EdgeKind::CoOccurrence).unwrap(),
            "\"co-occurrence\""
        );
        assert_eq!(EdgeKind::Hierarchical.to_string(), "hierarchical");
    }

    #[test]
    fn test_link_serializes_kind_as_type() {
        let link = GraphLink {
            source: "a".into(),
            target: "b".into(),
            value: 0.4,
            confidence: 0.6,
            kind: EdgeKind::Semantic,
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["type"], "semantic");
    }
}
