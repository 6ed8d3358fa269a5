//! End-to-end runs: documents to chunks to embeddings to clusters to graph.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::config::Settings;
use crate::error::{PipelineError, PipelineResult};
use crate::graph::{
    ClusterProfile, ClusterSimilarity, GraphBuilder, GraphData, cluster_profiles,
    cluster_similarities,
};
use crate::pipeline::cache::ResponseCache;
use crate::pipeline::chunking::Chunker;
use crate::pipeline::embedding::{
    EmbeddingGenerator, LocalTfIdfGenerator, assign_keywords, embed_chunks,
};
use crate::pipeline::validation::{
    ValidationReport, validate_chunks, validate_cluster_points, validate_embeddings,
    validate_graph, validate_pipeline_integrity,
};
use crate::types::{ClusterPoint, DocumentChunk, EmbeddingVector, SourceDocument};
use crate::vector::{KMeansOptions, cluster_with, fallback_layout, project_2d, silhouette};

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Upload,
    Embeddings,
    Clustering,
    Graph,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Embeddings => "embeddings",
            Self::Clustering => "clustering",
            Self::Graph => "graph",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster points with their layout quality.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLayout {
    pub points: Vec<ClusterPoint>,
    /// Sampled silhouette; 0 for the small-input fallback
    pub silhouette: f32,
    pub k: usize,
    pub iterations: usize,
    /// True when too few points were given to run K-Means
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed_ms: f64,
}

/// Progress notifications emitted while a run advances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageEvent {
    Started(PipelineStage),
    Finished(StageTiming),
}

type Observer = Box<dyn Fn(StageEvent) + Send + Sync>;

/// Everything produced by one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub chunks: Vec<DocumentChunk>,
    pub embeddings: Vec<EmbeddingVector>,
    pub layout: ClusterLayout,
    pub graph: GraphData,
    pub profiles: Vec<ClusterProfile>,
    pub similarities: Vec<ClusterSimilarity>,
    pub timings: Vec<StageTiming>,
}

/// Runs the stages with one set of settings, generator and embedding cache.
pub struct Pipeline {
    settings: Settings,
    chunker: Chunker,
    generator: Box<dyn EmbeddingGenerator>,
    cache: ResponseCache<Vec<f32>>,
    pool: rayon::ThreadPool,
    observer: Option<Observer>,
}

impl Pipeline {
    /// Creates a pipeline using the local TF-IDF generator from `settings`.
    pub fn new(settings: Settings) -> PipelineResult<Self> {
        let generator = Box::new(LocalTfIdfGenerator::new(settings.embedding.model));
        Self::with_generator(settings, generator)
    }

    pub fn with_generator(
        settings: Settings,
        generator: Box<dyn EmbeddingGenerator>,
    ) -> PipelineResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.clustering.threads)
            .build()
            .map_err(|e| PipelineError::ConfigError {
                reason: format!("cannot start {} clustering threads: {e}", settings.clustering.threads),
            })?;

        Ok(Self {
            chunker: Chunker::new(settings.chunking.clone()),
            cache: ResponseCache::new(settings.embedding.cache_capacity),
            settings,
            generator,
            pool,
            observer: None,
        })
    }

    /// Calls `observer` as each stage of [`Pipeline::run`] starts and finishes.
    pub fn set_observer(&mut self, observer: impl Fn(StageEvent) + Send + Sync + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn notify(&self, event: StageEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    fn start(&self, stage: PipelineStage) -> Instant {
        self.notify(StageEvent::Started(stage));
        Instant::now()
    }

    fn finish_stage(&self, timings: &mut Vec<StageTiming>, stage: PipelineStage, started: Instant) {
        let timing = StageTiming {
            stage,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        self.notify(StageEvent::Finished(timing));
        timings.push(timing);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &ResponseCache<Vec<f32>> {
        &self.cache
    }

    /// Splits documents into chunks and fills in missing keywords.
    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> PipelineResult<Vec<DocumentChunk>> {
        let mut chunks = self.chunker.chunk_documents(documents);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyInput {
                stage: PipelineStage::Upload,
            });
        }

        let keyworded = assign_keywords(&mut chunks, self.settings.embedding.keywords_per_chunk);
        log_report(PipelineStage::Upload, &validate_chunks(&chunks));

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            keyworded,
            "chunking complete"
        );
        Ok(chunks)
    }

    /// Embeds chunks, then checks every embedding maps back to a chunk.
    pub fn embed(&mut self, chunks: &[DocumentChunk]) -> PipelineResult<Vec<EmbeddingVector>> {
        if chunks.is_empty() {
            return Err(PipelineError::EmptyInput {
                stage: PipelineStage::Embeddings,
            });
        }

        let embeddings = embed_chunks(chunks, self.generator.as_ref(), &mut self.cache)?;
        log_report(PipelineStage::Embeddings, &validate_embeddings(&embeddings));
        validate_pipeline_integrity(chunks, &embeddings, None)?;

        let (hits, misses) = self.cache.stats();
        tracing::info!(
            embeddings = embeddings.len(),
            dimension = self.generator.dimension().get(),
            model = self.generator.model_name(),
            cache_hits = hits,
            cache_misses = misses,
            "embedding complete"
        );
        Ok(embeddings)
    }

    /// Clusters embeddings and places them on the 2D canvas.
    pub fn cluster_points(&self, embeddings: &[EmbeddingVector]) -> PipelineResult<ClusterLayout> {
        if embeddings.is_empty() {
            return Err(PipelineError::EmptyInput {
                stage: PipelineStage::Clustering,
            });
        }

        let vectors: Vec<&[f32]> = embeddings.iter().map(|e| e.vector.as_slice()).collect();
        let options = KMeansOptions {
            k: self.settings.clustering.k,
            max_iterations: self.settings.clustering.max_iterations,
            parallel_threshold: self.settings.clustering.parallel_threshold,
        };
        let clustering = self.pool.install(|| cluster_with(&vectors, options))?;

        let (positions, score) = if clustering.is_fallback() {
            (fallback_layout(vectors.len()), 0.0)
        } else {
            let score = silhouette(&vectors, clustering.assignments(), clustering.k());
            (project_2d(&vectors), score)
        };

        let points: Vec<ClusterPoint> = embeddings
            .iter()
            .zip(positions)
            .zip(clustering.assignments())
            .enumerate()
            .map(|(index, ((embedding, position), cluster))| {
                ClusterPoint::from_embedding(embedding, index, position, Some(*cluster))
            })
            .collect();
        log_report(PipelineStage::Clustering, &validate_cluster_points(&points));

        tracing::info!(
            points = points.len(),
            k = clustering.k(),
            iterations = clustering.iterations(),
            silhouette = score,
            fallback = clustering.is_fallback(),
            "clustering complete"
        );

        Ok(ClusterLayout {
            points,
            silhouette: score,
            k: clustering.k(),
            iterations: clustering.iterations(),
            fallback: clustering.is_fallback(),
        })
    }

    /// Builds and validates the graph for a layout.
    pub fn build_graph(&self, layout: &ClusterLayout) -> PipelineResult<GraphData> {
        let graph = GraphBuilder::new()
            .with_silhouette(layout.silhouette)
            .build(&layout.points);
        validate_graph(&graph)?;

        tracing::info!(
            nodes = graph.metrics.total_nodes,
            edges = graph.metrics.total_edges,
            density = graph.metrics.density,
            components = graph.metrics.connected_components,
            "graph complete"
        );
        Ok(graph)
    }

    /// Runs every stage over `documents`.
    pub fn run(&mut self, documents: &[SourceDocument]) -> PipelineResult<PipelineRun> {
        let _span = tracing::info_span!("pipeline", documents = documents.len()).entered();
        let mut timings = Vec::with_capacity(4);

        let started = self.start(PipelineStage::Upload);
        let chunks = self.chunk_documents(documents)?;
        self.finish_stage(&mut timings, PipelineStage::Upload, started);

        let started = self.start(PipelineStage::Embeddings);
        let embeddings = self.embed(&chunks)?;
        self.finish_stage(&mut timings, PipelineStage::Embeddings, started);

        self.finish(chunks, embeddings, timings)
    }

    /// Runs clustering and graph building over precomputed embeddings.
    pub fn run_from_embeddings(
        &mut self,
        embeddings: Vec<EmbeddingVector>,
    ) -> PipelineResult<PipelineRun> {
        let _span = tracing::info_span!("pipeline", embeddings = embeddings.len()).entered();
        self.finish(Vec::new(), embeddings, Vec::with_capacity(2))
    }

    fn finish(
        &self,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<EmbeddingVector>,
        mut timings: Vec<StageTiming>,
    ) -> PipelineResult<PipelineRun> {
        let started = self.start(PipelineStage::Clustering);
        let layout = self.cluster_points(&embeddings)?;
        if !chunks.is_empty() {
            validate_pipeline_integrity(&chunks, &embeddings, Some(&layout.points))?;
        }
        self.finish_stage(&mut timings, PipelineStage::Clustering, started);

        let started = self.start(PipelineStage::Graph);
        let graph = self.build_graph(&layout)?;
        let profiles = cluster_profiles(&graph);
        let similarities = cluster_similarities(&graph);
        self.finish_stage(&mut timings, PipelineStage::Graph, started);

        for t in &timings {
            tracing::debug!(stage = %t.stage, elapsed_ms = t.elapsed_ms, "stage timing");
        }

        Ok(PipelineRun {
            chunks,
            embeddings,
            layout,
            graph,
            profiles,
            similarities,
            timings,
        })
    }
}

/// Invalid records are reported, not fatal.
fn log_report(stage: PipelineStage, report: &ValidationReport) {
    if report.is_clean() {
        return;
    }
    tracing::warn!(
        stage = %stage,
        valid = report.valid,
        invalid = report.invalid,
        first_errors = ?report.errors.iter().take(5).collect::<Vec<_>>(),
        "records failed validation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.clustering.threads = 1;
        settings
    }

    fn documents() -> Vec<SourceDocument> {
        vec![SourceDocument::new(
            "lei.txt",
            "Art. 1º O imposto sobre a renda incide sobre o lucro.\n\n\
             Art. 2º O imposto sobre a renda das pessoas físicas é anual.\n\n\
             Art. 3º A multa por atraso na declaração é devida.\n\n\
             Art. 4º A multa incide sobre o valor do imposto devido.\n\n\
             CAPÍTULO II\n\n\
             Art. 5º O prazo de entrega da declaração é fixado em lei.",
        )]
    }

    #[test]
    fn test_run_produces_consistent_stages() {
        let mut pipeline = Pipeline::new(settings()).unwrap();
        let run = pipeline.run(&documents()).unwrap();

        assert_eq!(run.chunks.len(), 6);
        assert_eq!(run.embeddings.len(), run.chunks.len());
        assert_eq!(run.layout.points.len(), run.chunks.len());
        assert_eq!(run.graph.nodes.len(), run.chunks.len());
        assert!(!run.layout.fallback);
        assert_eq!(run.layout.k, 2);
        assert_eq!(run.timings.len(), 4);
        assert_eq!(run.graph.metrics.silhouette_score, run.layout.silhouette);
        assert!(run.chunks.iter().all(|c| !c.keywords.is_empty()));
    }

    #[test]
    fn test_run_is_deterministic() {
        let first = Pipeline::new(settings()).unwrap().run(&documents()).unwrap();
        let second = Pipeline::new(settings()).unwrap().run(&documents()).unwrap();
        assert_eq!(first.graph, second.graph);
        assert_eq!(first.layout, second.layout);
    }

    #[test]
    fn test_second_run_hits_cache() {
        let mut pipeline = Pipeline::new(settings()).unwrap();
        pipeline.run(&documents()).unwrap();
        pipeline.run(&documents()).unwrap();
        let (hits, _) = pipeline.cache().stats();
        assert_eq!(hits, 6);
    }

    #[test]
    fn test_observer_sees_every_stage() {
        use std::sync::{Arc, Mutex};

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut pipeline = Pipeline::new(settings()).unwrap();
        pipeline.set_observer(move |event| sink.lock().unwrap().push(event));
        pipeline.run(&documents()).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 8);
        assert_eq!(events[0], StageEvent::Started(PipelineStage::Upload));
        assert!(matches!(
            events[7],
            StageEvent::Finished(StageTiming {
                stage: PipelineStage::Graph,
                ..
            })
        ));
    }

    #[test]
    fn test_small_input_uses_fallback_layout() {
        let docs = vec![SourceDocument::new("a.txt", "Art. 1º Primeiro.\n\nArt. 2º Segundo.")];
        let run = Pipeline::new(settings()).unwrap().run(&docs).unwrap();

        assert!(run.layout.fallback);
        assert_eq!(run.layout.silhouette, 0.0);
        assert_eq!((run.layout.points[0].x, run.layout.points[0].y), (30.0, 40.0));
        assert!(run.layout.points.iter().all(|p| p.cluster_id.map(|c| c.get()) == Some(0)));
    }

    #[test]
    fn test_empty_documents_are_rejected() {
        let docs = vec![SourceDocument::new("vazio.txt", "   ")];
        let err = Pipeline::new(settings()).unwrap().run(&docs).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyInput {
                stage: PipelineStage::Upload
            }
        ));
    }

    #[test]
    fn test_same_text_in_similar_files_keeps_nodes_distinct() {
        let body = "Art. 1º O imposto sobre a renda incide sobre o lucro.\n\n\
                    Art. 2º A multa por atraso na declaração é devida.\n\n\
                    Art. 3º O prazo de entrega é fixado em lei.";
        let docs = vec![
            SourceDocument::new("contrato1.txt", body),
            SourceDocument::new("contrato2.txt", body),
        ];
        let run = Pipeline::new(settings()).unwrap().run(&docs).unwrap();

        let ids: std::collections::HashSet<&str> =
            run.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(run.graph.nodes.len(), 6);
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_repeated_embedding_ids_are_rejected() {
        let record = |id: &str, vector: Vec<f32>| EmbeddingVector {
            id: id.to_string(),
            vector,
            entity_type: None,
            entity_label: None,
            keywords: Vec::new(),
            full_content: format!("texto {id}"),
            model_used: "test".to_string(),
        };
        let embeddings = vec![
            record("a", vec![1.0, 0.0]),
            record("a", vec![0.9, 0.1]),
            record("b", vec![0.0, 1.0]),
        ];
        let err = Pipeline::new(settings())
            .unwrap()
            .run_from_embeddings(embeddings)
            .unwrap_err();
        assert_eq!(err.status_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_explicit_zero_k_is_an_error() {
        let mut settings = settings();
        settings.clustering.k = Some(0);
        let err = Pipeline::new(settings).unwrap().run(&documents()).unwrap_err();
        assert_eq!(err.status_code(), "CLUSTERING_ERROR");
    }
}
