//! Full runs from text documents to a validated graph.

use crate::common::{sample_documents, test_settings};
use knowgraph::graph::GraphData;
use knowgraph::pipeline::{Pipeline, PipelineStage, validate_graph};
use knowgraph::types::SourceDocument;
use knowgraph::{PipelineError, Settings};
use std::collections::HashSet;

fn run_corpus(settings: Settings) -> knowgraph::PipelineRun {
    Pipeline::new(settings)
        .expect("pipeline starts")
        .run(&sample_documents::corpus())
        .expect("corpus runs")
}

#[test]
fn test_corpus_produces_one_node_per_chunk() {
    let run = run_corpus(test_settings());

    assert_eq!(run.chunks.len(), 15);
    assert_eq!(run.embeddings.len(), 15);
    assert_eq!(run.graph.nodes.len(), 15);
    assert_eq!(run.graph.metrics.total_nodes, 15);
    assert_eq!(run.layout.k, 3);
    assert!(!run.layout.fallback);

    let ids: HashSet<&str> = run.chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), run.chunks.len(), "chunk ids are unique");
    for node in &run.graph.nodes {
        assert!(ids.contains(node.id.as_str()));
    }
}

#[test]
fn test_chunks_carry_structure() {
    let run = run_corpus(test_settings());
    let first = &run.chunks[0];

    assert!(first.id.starts_with("chk_tribu_0_0_"));
    assert_eq!(first.entity_type.as_deref(), Some("ESTRUTURA_MACRO"));
    assert_eq!(first.entity_label.as_deref(), Some("CAPÍTULO I"));

    let labels: Vec<&str> = run
        .chunks
        .iter()
        .filter_map(|c| c.entity_label.as_deref())
        .collect();
    for expected in ["Art. 1º", "§ 1º", "Inciso II", "Art. 121.", "Parágrafo único", "Alínea b)"] {
        assert!(labels.contains(&expected), "missing label {expected}");
    }
    assert!(run.chunks.iter().any(|c| c.id.starts_with("chk_penal_1_")));
}

#[test]
fn test_graph_satisfies_structural_invariants() {
    let run = run_corpus(test_settings());
    let graph = &run.graph;

    validate_graph(graph).expect("graph is valid");

    let mut pairs = HashSet::new();
    for link in &graph.links {
        assert_ne!(link.source, link.target, "no self loops");
        assert!(link.source < link.target, "lower id is the source");
        let pair = (link.source.clone(), link.target.clone());
        assert!(pairs.insert(pair), "one edge per pair");
        assert!(link.value > 0.0 && link.value <= 1.0);
        assert!(link.confidence > 0.3 && link.confidence <= 1.0);
    }

    let metrics = graph.metrics;
    assert!((0.0..=1.0).contains(&metrics.density));
    assert!(metrics.connected_components >= 1);
    assert!(metrics.connected_components <= metrics.total_nodes);
    assert_eq!(metrics.total_edges, graph.links.len());
    for node in &graph.nodes {
        assert!((0.0..=1.0).contains(&node.centrality));
        assert!(node.group < 3);
    }
}

#[test]
fn test_profiles_cover_every_cluster() {
    let run = run_corpus(test_settings());

    let grouped: HashSet<u32> = run.graph.nodes.iter().map(|n| n.group).collect();
    let profiled: HashSet<u32> = run.profiles.iter().map(|p| p.cluster_id).collect();
    assert_eq!(grouped, profiled);

    let members: usize = run.profiles.iter().map(|p| p.node_count).sum();
    assert_eq!(members, run.graph.nodes.len());

    for window in run.similarities.windows(2) {
        assert!(window[0].score >= window[1].score);
    }
}

#[test]
fn test_graph_json_round_trips() {
    let run = run_corpus(test_settings());

    let json = serde_json::to_string(&run.graph).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["metrics"]["avgDegree"].is_number());
    assert!(value["metrics"]["connectedComponents"].is_number());
    if let Some(link) = value["links"].as_array().and_then(|l| l.first()) {
        assert!(link["type"].is_string());
    }

    let parsed: GraphData = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, run.graph);
}

#[test]
fn test_rerun_from_saved_embeddings_matches() {
    let run = run_corpus(test_settings());

    let saved = serde_json::to_string(&run.embeddings).unwrap();
    let restored = serde_json::from_str(&saved).unwrap();
    let replay = Pipeline::new(test_settings())
        .unwrap()
        .run_from_embeddings(restored)
        .unwrap();

    assert!(replay.chunks.is_empty());
    assert_eq!(replay.layout, run.layout);
    assert_eq!(replay.graph, run.graph);
    assert_eq!(replay.timings.len(), 2);
}

#[test]
fn test_explicit_k_is_clamped_to_input_size() {
    let mut settings = test_settings();
    settings.clustering.k = Some(50);
    let run = run_corpus(settings);
    assert_eq!(run.layout.k, 15);
}

#[test]
fn test_sentence_bert_profile_changes_dimension() {
    let mut settings = test_settings();
    settings.embedding.model = knowgraph::config::EmbeddingModel::SentenceBert;
    let run = run_corpus(settings);

    assert!(run.embeddings.iter().all(|e| e.vector.len() == 768));
    assert!(run.embeddings[0].model_used.contains("Sentence-BERT"));
}

#[test]
fn test_blank_documents_fail_at_upload() {
    let documents = vec![SourceDocument::new("a.txt", "\n\n"), SourceDocument::new("b.txt", "")];
    let err = Pipeline::new(test_settings())
        .unwrap()
        .run(&documents)
        .unwrap_err();

    match err {
        PipelineError::EmptyInput { stage } => assert_eq!(stage, PipelineStage::Upload),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_embeddings_fail_at_clustering() {
    let err = Pipeline::new(test_settings())
        .unwrap()
        .run_from_embeddings(Vec::new())
        .unwrap_err();
    assert_eq!(err.status_code(), "EMPTY_INPUT");
}
