//! Property tests for clustering, projection and graph invariants.

use crate::common::point;
use knowgraph::graph::build_graph;
use knowgraph::types::ClusterPoint;
use knowgraph::vector::{cluster, project_2d, silhouette};
use proptest::prelude::*;
use std::collections::HashSet;

fn vector_sets(max_len: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    (1usize..8).prop_flat_map(move |dim| {
        prop::collection::vec(prop::collection::vec(-10.0f32..10.0, dim), 3..max_len)
    })
}

fn points() -> impl Strategy<Value = Vec<ClusterPoint>> {
    let vocabulary = prop::sample::select(vec![
        "imposto", "renda", "multa", "pena", "crime", "prazo", "lucro",
    ]);
    let entity = prop::option::of(prop::sample::select(vec!["ARTIGO", "INCISO", "PARAGRAFO"]));
    let record = (
        prop::option::of(0u32..4),
        entity,
        prop::collection::vec(vocabulary, 0..4),
    );
    prop::collection::vec(record, 0..24).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(i, (cluster, entity, keywords))| {
                point(&format!("n{i}"), cluster, entity, &keywords)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_assignments_stay_in_range(vectors in vector_sets(40), k in 1usize..6) {
        let clustering = cluster(&vectors, Some(k)).unwrap();
        let effective = clustering.k();
        prop_assert_eq!(clustering.assignments().len(), vectors.len());
        prop_assert!(effective <= k.min(vectors.len()));
        for id in clustering.assignments() {
            prop_assert!(id.index() < effective);
        }
    }

    #[test]
    fn prop_clustering_is_deterministic(vectors in vector_sets(30)) {
        let first = cluster(&vectors, None).unwrap();
        let second = cluster(&vectors, None).unwrap();
        prop_assert_eq!(first.assignments(), second.assignments());
        prop_assert_eq!(project_2d(&vectors), project_2d(&vectors));
    }

    #[test]
    fn prop_silhouette_is_bounded(vectors in vector_sets(30)) {
        let clustering = cluster(&vectors, None).unwrap();
        let score = silhouette(&vectors, clustering.assignments(), clustering.k());
        prop_assert!(score.is_finite());
        prop_assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn prop_graph_invariants(points in points()) {
        let graph = build_graph(&points);
        prop_assert_eq!(graph.nodes.len(), points.len());

        let mut pairs = HashSet::new();
        for link in &graph.links {
            prop_assert_ne!(&link.source, &link.target);
            prop_assert!(link.source < link.target);
            let pair = (link.source.clone(), link.target.clone());
            prop_assert!(pairs.insert(pair));
            prop_assert!(link.value > 0.0 && link.value <= 1.0);
            prop_assert!(link.confidence > 0.3 && link.confidence <= 1.0);
        }

        let metrics = graph.metrics;
        prop_assert!((0.0..=1.0).contains(&metrics.density));
        prop_assert!(metrics.avg_degree >= 0.0);
        prop_assert_eq!(metrics.total_edges, graph.links.len());
        if points.is_empty() {
            prop_assert_eq!(metrics.connected_components, 0);
        } else {
            prop_assert!(metrics.connected_components >= 1);
        }
        for node in &graph.nodes {
            prop_assert!((0.0..=1.0).contains(&node.centrality));
        }

        prop_assert_eq!(build_graph(&points), graph);
    }
}
