//! Per-cluster summaries over a built graph.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::graph::types::GraphData;

/// Keywords listed per cluster profile.
pub const TOP_KEYWORDS: usize = 5;

/// Leading keywords repeated as the cluster's main topics.
pub const MAIN_TOPICS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    /// Number of member nodes carrying the keyword
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    pub cluster_id: u32,
    pub node_count: usize,
    pub top_keywords: Vec<KeywordCount>,
    pub main_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSimilarity {
    pub target_cluster_id: u32,
    pub similar_cluster_id: u32,
    /// Jaccard index of the two keyword vocabularies
    pub score: f32,
    pub shared_keywords: Vec<String>,
}

/// Lower-cased keyword counts per group, counting each node at most once per keyword.
fn group_vocabularies(graph: &GraphData) -> BTreeMap<u32, (usize, HashMap<String, usize>)> {
    let mut groups: BTreeMap<u32, (usize, HashMap<String, usize>)> = BTreeMap::new();
    for node in &graph.nodes {
        let (count, vocabulary) = groups.entry(node.group).or_default();
        *count += 1;

        let unique: BTreeSet<String> = node
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        for keyword in unique {
            *vocabulary.entry(keyword).or_default() += 1;
        }
    }
    groups
}

/// One profile per group, ordered by group id.
///
/// Keywords rank by member count, ties broken alphabetically.
pub fn cluster_profiles(graph: &GraphData) -> Vec<ClusterProfile> {
    group_vocabularies(graph)
        .into_iter()
        .map(|(cluster_id, (node_count, vocabulary))| {
            let mut ranked: Vec<KeywordCount> = vocabulary
                .into_iter()
                .map(|(word, count)| KeywordCount { word, count })
                .collect();
            ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
            ranked.truncate(TOP_KEYWORDS);

            let main_topics = ranked
                .iter()
                .take(MAIN_TOPICS)
                .map(|k| k.word.clone())
                .collect();

            ClusterProfile {
                cluster_id,
                node_count,
                top_keywords: ranked,
                main_topics,
            }
        })
        .collect()
}

/// Pairs of groups whose keyword vocabularies overlap, most similar first.
pub fn cluster_similarities(graph: &GraphData) -> Vec<ClusterSimilarity> {
    let vocabularies: Vec<(u32, BTreeSet<String>)> = group_vocabularies(graph)
        .into_iter()
        .map(|(id, (_, vocabulary))| (id, vocabulary.into_keys().collect()))
        .collect();

    let mut similarities = Vec::new();
    for (offset, (target, target_words)) in vocabularies.iter().enumerate() {
        for (similar, similar_words) in &vocabularies[offset + 1..] {
            let shared: Vec<String> = target_words
                .intersection(similar_words)
                .cloned()
                .collect();
            if shared.is_empty() {
                continue;
            }
            let union = target_words.union(similar_words).count();
            similarities.push(ClusterSimilarity {
                target_cluster_id: *target,
                similar_cluster_id: *similar,
                score: shared.len() as f32 / union as f32,
                shared_keywords: shared,
            });
        }
    }

    similarities.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.target_cluster_id.cmp(&b.target_cluster_id))
            .then_with(|| a.similar_cluster_id.cmp(&b.similar_cluster_id))
    });
    similarities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::GraphNode;

    fn node(id: &str, group: u32, keywords: &[&str]) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            group,
            centrality: 0.0,
            full_content: String::new(),
            entity_type: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn graph(nodes: Vec<GraphNode>) -> GraphData {
        GraphData {
            nodes,
            ..GraphData::default()
        }
    }

    #[test]
    fn test_profiles_rank_keywords() {
        let g = graph(vec![
            node("a", 0, &["tributo", "lei", "prazo"]),
            node("b", 0, &["Tributo", "lei"]),
            node("c", 0, &["tributo", "tributo"]),
            node("d", 1, &["multa"]),
        ]);
        let profiles = cluster_profiles(&g);

        assert_eq!(profiles.len(), 2);
        let first = &profiles[0];
        assert_eq!(first.cluster_id, 0);
        assert_eq!(first.node_count, 3);
        assert_eq!(
            first.top_keywords[0],
            KeywordCount {
                word: "tributo".to_string(),
                count: 3
            }
        );
        assert_eq!(first.main_topics, vec!["tributo", "lei", "prazo"]);
        assert_eq!(profiles[1].main_topics, vec!["multa"]);
    }

    #[test]
    fn test_profiles_cap_keyword_lists() {
        let g = graph(vec![node("a", 2, &["k1", "k2", "k3", "k4", "k5", "k6", "k7"])]);
        let profile = &cluster_profiles(&g)[0];
        assert_eq!(profile.top_keywords.len(), TOP_KEYWORDS);
        assert_eq!(profile.main_topics.len(), MAIN_TOPICS);
    }

    #[test]
    fn test_similarities_use_jaccard() {
        let g = graph(vec![
            node("a", 0, &["tributo", "lei"]),
            node("b", 1, &["tributo", "multa"]),
            node("c", 2, &["prazo"]),
            node("d", 3, &["tributo", "lei"]),
        ]);
        let similarities = cluster_similarities(&g);

        assert_eq!(similarities.len(), 3);
        assert_eq!(
            (similarities[0].target_cluster_id, similarities[0].similar_cluster_id),
            (0, 3)
        );
        assert!((similarities[0].score - 1.0).abs() < 1e-6);
        assert!((similarities[1].score - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(similarities[1].shared_keywords, vec!["tributo"]);
        assert!(similarities.iter().all(|s| s.target_cluster_id != 2 && s.similar_cluster_id != 2));
    }

    #[test]
    fn test_empty_graph() {
        let g = GraphData::default();
        assert!(cluster_profiles(&g).is_empty());
        assert!(cluster_similarities(&g).is_empty());
    }
}
