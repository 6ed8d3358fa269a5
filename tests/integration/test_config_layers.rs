//! Settings files driving pipeline behavior.

use crate::common::{TestProject, sample_documents};
use knowgraph::Settings;
use knowgraph::pipeline::Pipeline;
use knowgraph::pipeline::chunking::ENTITY_CONTINUATION;
use knowgraph::types::SourceDocument;

#[test]
fn test_chunking_section_controls_subdivision() {
    let project = TestProject::new();
    let path = project.add_file(
        ".knowgraph/settings.toml",
        r#"
[chunking]
max_chunk_chars = 60
sub_chunk_chars = 40

[embedding]
keywords_per_chunk = 0

[clustering]
threads = 1
"#,
    );

    let settings = Settings::load_from(&path).unwrap();
    let long_article = format!("Art. 9º {}", "o contribuinte declara a renda anual ".repeat(4));
    let documents = vec![SourceDocument::new(
        "longo.txt",
        format!("{long_article}\n\nArt. 10 Curto.\n\nArt. 11 Outro curto."),
    )];

    let mut pipeline = Pipeline::new(settings).unwrap();
    let chunks = pipeline.chunk_documents(&documents).unwrap();

    assert!(chunks.len() > 3);
    assert_eq!(chunks[0].entity_label.as_deref(), Some("Art. 9º"));
    assert_eq!(chunks[1].entity_type.as_deref(), Some(ENTITY_CONTINUATION));
    assert!(chunks.iter().all(|c| c.keywords.is_empty()));
    assert!(chunks.iter().all(|c| c.content.chars().count() <= 60));

    let embeddings = pipeline.embed(&chunks).unwrap();
    assert_eq!(embeddings.len(), chunks.len());
}

#[test]
fn test_generated_template_runs_the_pipeline() {
    let project = TestProject::new();
    let path = Settings::init_config_file_in(project.path(), false).unwrap();
    assert!(path.ends_with(".knowgraph/settings.toml"));

    let mut settings = Settings::load_from(&path).unwrap();
    settings.clustering.threads = 1;
    assert_eq!(settings.chunking, Settings::default().chunking);

    let run = Pipeline::new(settings)
        .unwrap()
        .run(&sample_documents::corpus())
        .unwrap();
    assert_eq!(run.embeddings[0].vector.len(), 512);
}

#[test]
fn test_saved_settings_round_trip() {
    let project = TestProject::new();
    let path = project.path().join("custom").join("settings.toml");

    let mut settings = Settings::default();
    settings.clustering.k = Some(5);
    settings.embedding.cache_capacity = 0;
    settings.save(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.clustering.k, Some(5));
    assert_eq!(loaded.embedding.cache_capacity, 0);
    assert_eq!(loaded.chunking, settings.chunking);
}
