//! Turns cluster points into a weighted knowledge graph.
//!
//! Two evidence sources feed one edge map: a sparse keyword join through
//! [`KeywordIndex`] and a structural join between members of the same group.
//! Repeated evidence for a pair reinforces its edge instead of adding a second
//! one. Weak edges are dropped before metrics are computed.

use std::collections::{BTreeMap, HashSet};

use crate::graph::keywords::{KeywordIndex, KeywordOverlap};
use crate::graph::metrics;
use crate::graph::types::{EdgeKind, GraphData, GraphLink, GraphNode, UNCLUSTERED_GROUP};
use crate::types::ClusterPoint;

/// A keyword pair becomes a semantic edge only above this confidence.
pub const SEMANTIC_CREATE_THRESHOLD: f32 = 0.35;

/// Edges at or below this confidence are removed from the final graph.
pub const RETAIN_THRESHOLD: f32 = 0.3;

/// Keywords shared by more than this share of nodes are treated as stopwords.
pub const STOPWORD_SHARE: f64 = 0.6;

const OVERLAP_WEIGHT: f32 = 0.6;
const JACCARD_WEIGHT: f32 = 0.4;
const SEMANTIC_WEIGHT_FACTOR: f32 = 0.8;

/// `(weight, confidence)` for group members with the same entity type.
const SAME_TYPE_EVIDENCE: (f32, f32) = (0.4, 0.6);
/// `(weight, confidence)` for group members with different entity types.
const CROSS_TYPE_EVIDENCE: (f32, f32) = (0.2, 0.3);

const REINFORCE_VALUE: f32 = 0.5;
const REINFORCE_CONFIDENCE: f32 = 0.2;

/// Accumulated evidence for one node pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEvidence {
    pub value: f32,
    pub confidence: f32,
    pub kind: EdgeKind,
}

/// Undirected edges keyed by `(lower index, higher index)`.
///
/// Iteration order is the key order, so output built from the map is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct EdgeMap {
    edges: BTreeMap<(usize, usize), EdgeEvidence>,
}

impl EdgeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation of evidence between `a` and `b`.
    ///
    /// The first observation creates the edge as given. Later ones add half
    /// their weight to `value` and a fifth of their confidence to
    /// `confidence`, both capped at 1, and may upgrade the kind.
    /// Self-pairs are ignored.
    pub fn observe(&mut self, a: usize, b: usize, weight: f32, confidence: f32, kind: EdgeKind) {
        if a == b {
            return;
        }
        let key = (a.min(b), a.max(b));
        self.edges
            .entry(key)
            .and_modify(|edge| {
                edge.value = (edge.value + weight * REINFORCE_VALUE).min(1.0);
                edge.confidence = (edge.confidence + confidence * REINFORCE_CONFIDENCE).min(1.0);
                edge.kind = edge.kind.upgrade(kind);
            })
            .or_insert(EdgeEvidence {
                value: weight,
                confidence,
                kind,
            });
    }

    pub fn get(&self, a: usize, b: usize) -> Option<&EdgeEvidence> {
        self.edges.get(&(a.min(b), a.max(b)))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Drops every edge whose confidence is not above `threshold`.
    pub fn retain_above(&mut self, threshold: f32) {
        self.edges.retain(|_, edge| edge.confidence > threshold);
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &EdgeEvidence)> {
        self.edges.iter().map(|(key, edge)| (*key, edge))
    }
}

/// Builds [`GraphData`] from cluster points.
///
/// ```
/// use knowgraph::graph::GraphBuilder;
///
/// let graph = GraphBuilder::new().with_silhouette(0.42).build(&[]);
/// assert!(graph.nodes.is_empty());
/// assert_eq!(graph.metrics.silhouette_score, 0.42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    silhouette: f32,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Silhouette score copied into the graph metrics.
    pub fn with_silhouette(mut self, score: f32) -> Self {
        self.silhouette = score;
        self
    }

    pub fn build(&self, points: &[ClusterPoint]) -> GraphData {
        let mut nodes: Vec<GraphNode> = points.iter().map(node_from_point).collect();

        let mut edges = EdgeMap::new();
        let scored = semantic_join(points, &mut edges);
        let structural = structural_join(points, &nodes, &mut edges);

        let merged = edges.len();
        edges.retain_above(RETAIN_THRESHOLD);

        // Distinct points may still share an id; such pairs would render as self-loops.
        let pairs: Vec<(usize, usize)> = edges
            .iter()
            .map(|(pair, _)| pair)
            .filter(|&(a, b)| nodes[a].id != nodes[b].id)
            .collect();

        let links: Vec<GraphLink> = pairs
            .iter()
            .filter_map(|&(a, b)| {
                let (source, target) = if nodes[a].id <= nodes[b].id {
                    (&nodes[a].id, &nodes[b].id)
                } else {
                    (&nodes[b].id, &nodes[a].id)
                };
                edges.get(a, b).map(|edge| GraphLink {
                    source: source.clone(),
                    target: target.clone(),
                    value: edge.value,
                    confidence: edge.confidence,
                    kind: edge.kind,
                })
            })
            .collect();

        let groups: Vec<u32> = nodes.iter().map(|n| n.group).collect();
        let report = metrics::compute(&groups, &pairs, self.silhouette);
        for (index, node) in nodes.iter_mut().enumerate() {
            node.centrality = report.centrality(index);
        }

        tracing::debug!(
            nodes = nodes.len(),
            scored_pairs = scored,
            structural_pairs = structural,
            merged_edges = merged,
            kept_edges = links.len(),
            "graph built"
        );

        GraphData {
            nodes,
            links,
            metrics: report.metrics,
        }
    }
}

/// Builds a graph with a silhouette score of 0.
pub fn build_graph(points: &[ClusterPoint]) -> GraphData {
    GraphBuilder::new().build(points)
}

fn node_from_point(point: &ClusterPoint) -> GraphNode {
    GraphNode {
        id: point.id.clone(),
        label: point
            .entity_label
            .clone()
            .unwrap_or_else(|| point.label.clone()),
        group: point.cluster_id.map_or(UNCLUSTERED_GROUP, |c| c.get()),
        centrality: 0.0,
        full_content: point.full_content.clone(),
        entity_type: point.entity_type.clone(),
        keywords: point.keywords.clone(),
    }
}

/// Scores every pair sharing a non-stopword keyword, once per pair.
///
/// Returns the number of pairs scored.
fn semantic_join(points: &[ClusterPoint], edges: &mut EdgeMap) -> usize {
    let index = KeywordIndex::build(points.iter().map(|p| p.keywords.as_slice()));
    let suppressed = index.suppressed(STOPWORD_SHARE);
    if !suppressed.is_empty() {
        tracing::debug!(count = suppressed.len(), "keywords suppressed as stopwords");
    }

    let mut visited: HashSet<(usize, usize)> = HashSet::new();
    for (_, bucket) in index.join_buckets(STOPWORD_SHARE) {
        for (offset, &a) in bucket.iter().enumerate() {
            for &b in &bucket[offset + 1..] {
                if !visited.insert((a, b)) {
                    continue;
                }
                let Some(overlap) = KeywordOverlap::between(index.set(a), index.set(b)) else {
                    continue;
                };
                let confidence =
                    OVERLAP_WEIGHT * overlap.overlap_coefficient() + JACCARD_WEIGHT * overlap.jaccard();
                if confidence > SEMANTIC_CREATE_THRESHOLD {
                    edges.observe(
                        a,
                        b,
                        SEMANTIC_WEIGHT_FACTOR * confidence,
                        confidence,
                        EdgeKind::Semantic,
                    );
                }
            }
        }
    }
    visited.len()
}

/// Links every pair of nodes in the same group.
///
/// Returns the number of pairs observed.
fn structural_join(points: &[ClusterPoint], nodes: &[GraphNode], edges: &mut EdgeMap) -> usize {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        groups.entry(node.group).or_default().push(index);
    }

    let mut observed = 0;
    for members in groups.values().filter(|m| m.len() > 1) {
        for (offset, &a) in members.iter().enumerate() {
            for &b in &members[offset + 1..] {
                let (weight, confidence) = if points[a].entity_type == points[b].entity_type {
                    SAME_TYPE_EVIDENCE
                } else {
                    CROSS_TYPE_EVIDENCE
                };
                edges.observe(a, b, weight, confidence, EdgeKind::CoOccurrence);
                observed += 1;
            }
        }
    }
    observed
}
