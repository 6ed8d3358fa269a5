//! Shared fixtures for integration tests.
#![allow(dead_code)]

use knowgraph::types::{ClusterPoint, EmbeddingVector, SourceDocument};
use knowgraph::{ClusterId, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Settings with a single clustering thread so runs are cheap in parallel tests.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.clustering.threads = 1;
    settings
}

pub fn point(id: &str, cluster: Option<u32>, entity_type: Option<&str>, keywords: &[&str]) -> ClusterPoint {
    ClusterPoint {
        id: id.to_string(),
        label: id.to_string(),
        x: 0.0,
        y: 0.0,
        cluster_id: cluster.map(ClusterId::new),
        full_content: format!("content of {id}"),
        entity_type: entity_type.map(str::to_string),
        entity_label: None,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

pub fn embedding(id: &str, vector: Vec<f32>, keywords: &[&str]) -> EmbeddingVector {
    EmbeddingVector {
        id: id.to_string(),
        vector,
        entity_type: Some("ARTIGO".to_string()),
        entity_label: Some(format!("Art. {id}")),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        full_content: format!("content of {id}"),
        model_used: "fixture".to_string(),
    }
}

pub mod sample_documents {
    use super::SourceDocument;

    pub const TAX_LAW: &str = "CAPÍTULO I\n\n\
        Art. 1º O imposto sobre a renda incide sobre o lucro real das empresas.\n\n\
        Art. 2º O imposto sobre a renda das pessoas físicas é apurado anualmente.\n\n\
        § 1º A base de cálculo do imposto considera os rendimentos tributáveis.\n\n\
        I - os rendimentos do trabalho assalariado;\n\n\
        II - os rendimentos de aluguel e royalties;\n\n\
        CAPÍTULO II\n\n\
        Art. 3º A multa por atraso na entrega da declaração é de um por cento ao mês.\n\n\
        Art. 4º A multa não excederá vinte por cento do imposto devido.";

    pub const PENAL_CODE: &str = "TÍTULO I\n\n\
        Art. 121. Matar alguém: pena de reclusão de seis a vinte anos.\n\n\
        Parágrafo único. A pena é aumentada se o crime é praticado contra menor.\n\n\
        Art. 155. Subtrair coisa alheia móvel: pena de reclusão de um a quatro anos.\n\n\
        a) se o crime é cometido durante o repouso noturno;\n\n\
        b) se a coisa subtraída é veículo automotor.";

    pub fn corpus() -> Vec<SourceDocument> {
        vec![
            SourceDocument::new("tributario.txt", TAX_LAW),
            SourceDocument::new("penal.txt", PENAL_CODE),
        ]
    }
}
