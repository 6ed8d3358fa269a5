//! Runs that start from precomputed embeddings.

use crate::common::{embedding, test_settings};
use knowgraph::graph::EdgeKind;
use knowgraph::io::ExitCode;
use knowgraph::pipeline::Pipeline;
use knowgraph::types::EmbeddingVector;

/// Two well separated groups, interleaved so the first two seeds differ.
fn two_topics() -> Vec<EmbeddingVector> {
    let tax = |i: f32| vec![1.0 + 0.01 * i, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    let penal = |i: f32| vec![-1.0, -1.0 - 0.01 * i, -1.0, -1.0, -1.0, 0.0, 0.0, 0.0];
    vec![
        embedding("t0", tax(0.0), &["imposto", "renda"]),
        embedding("p0", penal(0.0), &["pena", "crime"]),
        embedding("t1", tax(1.0), &["imposto", "renda"]),
        embedding("p1", penal(1.0), &["pena", "crime"]),
        embedding("t2", tax(2.0), &["imposto", "renda"]),
        embedding("p2", penal(2.0), &["pena", "crime"]),
    ]
}

#[test]
fn test_separated_topics_form_two_components() {
    let mut settings = test_settings();
    settings.clustering.k = Some(2);
    let run = Pipeline::new(settings)
        .unwrap()
        .run_from_embeddings(two_topics())
        .unwrap();

    let group = |id: &str| run.graph.node(id).unwrap().group;
    assert_eq!(group("t0"), group("t1"));
    assert_eq!(group("t0"), group("t2"));
    assert_eq!(group("p0"), group("p2"));
    assert_ne!(group("t0"), group("p0"));

    let metrics = run.graph.metrics;
    assert_eq!(metrics.total_edges, 6);
    assert_eq!(metrics.connected_components, 2);
    assert!((metrics.density - 0.4).abs() < 1e-6);
    assert!(metrics.silhouette_score > 0.9);

    assert!(run.graph.link_between("t0", "p0").is_none());
    let link = run.graph.link_between("t1", "t0").unwrap();
    assert_eq!(link.kind, EdgeKind::Semantic);

    assert_eq!(run.profiles.len(), 2);
    assert!(run.similarities.is_empty());
}

#[test]
fn test_camel_case_json_input() {
    let json = r#"[
        {"id": "a", "vector": [0.1, 0.2, 0.3], "keywords": ["tributo"], "entityLabel": "Art. 1º"},
        {"id": "b", "vector": [0.2, 0.1, 0.3], "keywords": ["tributo"]}
    ]"#;
    let records: Vec<EmbeddingVector> = serde_json::from_str(json).unwrap();
    let run = Pipeline::new(test_settings())
        .unwrap()
        .run_from_embeddings(records)
        .unwrap();

    // Two points use the fixed layout in one cluster
    assert!(run.layout.fallback);
    assert_eq!(run.graph.node("a").unwrap().label, "Art. 1º");
    assert_eq!(run.graph.node("b").unwrap().label, "Chunk 1");
}

#[test]
fn test_mixed_dimensions_are_rejected() {
    let mut records = two_topics();
    records[3].vector.truncate(4);

    let err = Pipeline::new(test_settings())
        .unwrap()
        .run_from_embeddings(records)
        .unwrap_err();
    assert_eq!(err.status_code(), "CLUSTERING_ERROR");
    assert_eq!(ExitCode::from_error(&err), ExitCode::ClusteringError);
}
