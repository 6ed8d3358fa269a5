//! CLI entry point for the knowledge-graph pipeline.
//!
//! Commands: `init`, `config`, `build` (documents to graph) and `graph`
//! (precomputed embeddings to graph).

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use knowgraph::display::{
    StageProgress, THEME, create_cluster_table, create_metrics_table, create_similarity_table,
    create_timing_table,
};
use knowgraph::error::PipelineError;
use knowgraph::io::{ExitCode, JsonResponse, OutputFormat, ResponseMeta};
use knowgraph::pipeline::{Pipeline, PipelineRun};
use knowgraph::types::{EmbeddingVector, SourceDocument};
use knowgraph::{Settings, logging};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File extensions read when a directory is given to `build`.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Knowledge graphs from unstructured text
#[derive(Parser)]
#[command(
    name = "knowgraph",
    version = env!("CARGO_PKG_VERSION"),
    about = "Build knowledge graphs from documents",
    long_about = "Chunk documents, embed and cluster the chunks, and join them into a weighted similarity graph.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides settings and RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .knowgraph directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(
        about = "Build a graph from text documents",
        after_help = "Examples:\n  knowgraph build docs/\n  knowgraph build lei.txt decreto.txt --k 4\n  knowgraph build docs/ --json --output graph.json"
    )]
    Build {
        /// Text files, or directories of .txt/.md files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    #[command(about = "Build a graph from precomputed embeddings (JSON array)")]
    Graph {
        /// JSON file with an array of embedding records
        embeddings: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Number of clusters (default: chosen from the input size)
    #[arg(short, long)]
    k: Option<usize>,

    /// Number of clustering threads (overrides config)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Output JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Write the graph JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Payload of a successful `build`/`graph` JSON response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    chunks: usize,
    embeddings: usize,
    k: usize,
    iterations: usize,
    fallback: bool,
    metrics: &'a knowgraph::graph::GraphMetrics,
    profiles: &'a [knowgraph::graph::ClusterProfile],
    similarities: &'a [knowgraph::graph::ClusterSimilarity],
    timings: &'a [knowgraph::pipeline::StageTiming],
    #[serde(skip_serializing_if = "Option::is_none")]
    graph_file: Option<&'a Path>,
}

fn main() {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    let (level, prefer_level) = match &cli.log_level {
        Some(level) => (level.as_str(), true),
        None => (config.logging.level.as_str(), false),
    };
    if let Err(e) = logging::init(level, prefer_level) {
        eprintln!("{}", THEME.warning_with_icon(&e.to_string()));
    }

    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            tracing::info!("{warning}; using default configuration");
        }
    }

    let code = match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Config => run_config(&config),
        Commands::Build { paths, output } => {
            let format = OutputFormat::from_json_flag(output.json);
            match load_documents(&paths) {
                Ok(documents) => execute(config, &output, format, |pipeline| {
                    pipeline.run(&documents)
                }),
                Err(e) => report_load_error(&e, format),
            }
        }
        Commands::Graph { embeddings, output } => {
            let format = OutputFormat::from_json_flag(output.json);
            match load_embeddings(&embeddings) {
                Ok(records) => execute(config, &output, format, |pipeline| {
                    pipeline.run_from_embeddings(records)
                }),
                Err(e) => report_load_error(&e, format),
            }
        }
    };

    std::process::exit(code.into());
}

fn run_init(force: bool) -> ExitCode {
    match Settings::init_config_file(force) {
        Ok(path) => {
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            );
            println!("Edit this file to customize your settings.");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            eprintln!("Use --force to overwrite");
            ExitCode::ConfigError
        }
    }
}

fn run_config(config: &Settings) -> ExitCode {
    match toml::to_string_pretty(config) {
        Ok(text) => {
            println!("{}", THEME.apply(&THEME.header, "Active settings"));
            println!("{text}");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("Cannot render settings: {e}")));
            ExitCode::GeneralError
        }
    }
}

/// Builds a pipeline for `args`, runs `stages` and reports the outcome.
fn execute<F>(mut config: Settings, args: &OutputArgs, format: OutputFormat, stages: F) -> ExitCode
where
    F: FnOnce(&mut Pipeline) -> Result<PipelineRun, PipelineError>,
{
    let started = Instant::now();
    if args.k.is_some() {
        config.clustering.k = args.k;
    }
    if let Some(threads) = args.threads {
        config.clustering.threads = threads.max(1);
    }

    let outcome = Pipeline::new(config).and_then(|mut pipeline| {
        let progress = if format.is_json() {
            StageProgress::hidden()
        } else {
            StageProgress::new(4)
        };
        let observer = progress.clone();
        pipeline.set_observer(move |event| observer.observe(event));
        let run = stages(&mut pipeline);
        progress.finish();
        run
    });

    let result = outcome.and_then(|run| {
        if let Some(path) = &args.output {
            write_graph(&run, path)?;
        }
        Ok(run)
    });

    match result {
        Ok(run) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            report_run(&run, args.output.as_deref(), format, elapsed_ms);
            ExitCode::Success
        }
        Err(e) => report_error(&e, format),
    }
}

fn write_graph(run: &PipelineRun, path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(&run.graph).map_err(|source| {
        PipelineError::Serialization {
            what: "graph".to_string(),
            source,
        }
    })?;
    std::fs::write(path, json).map_err(|source| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn report_run(run: &PipelineRun, graph_file: Option<&Path>, format: OutputFormat, elapsed_ms: u64) {
    if format.is_json() {
        let summary = RunSummary {
            chunks: run.chunks.len(),
            embeddings: run.embeddings.len(),
            k: run.layout.k,
            iterations: run.layout.iterations,
            fallback: run.layout.fallback,
            metrics: &run.graph.metrics,
            profiles: &run.profiles,
            similarities: &run.similarities,
            timings: &run.timings,
            graph_file,
        };
        let response = JsonResponse::success(summary)
            .with_message(format!(
                "Built graph with {} nodes and {} edges",
                run.graph.metrics.total_nodes, run.graph.metrics.total_edges
            ))
            .with_meta(ResponseMeta::now(Some(elapsed_ms)));
        print_json(&response);
        return;
    }

    println!(
        "{}",
        THEME.success_with_icon(&format!(
            "Built graph from {} chunks into {} clusters",
            THEME.apply(&THEME.number, run.layout.points.len()),
            THEME.apply(&THEME.number, run.layout.k)
        ))
    );
    if run.layout.fallback {
        println!(
            "{}",
            THEME.warning_with_icon("Too few chunks for k-means; using a single-cluster layout")
        );
    }

    println!("{}", THEME.section("Graph metrics"));
    println!("{}", create_metrics_table(&run.graph.metrics));

    if !run.profiles.is_empty() {
        println!("{}", THEME.section("Clusters"));
        println!("{}", create_cluster_table(&run.profiles));
    }
    if !run.similarities.is_empty() {
        println!("{}", THEME.section("Related clusters"));
        println!("{}", create_similarity_table(&run.similarities));
    }

    println!("{}", THEME.section("Timing"));
    println!("{}", create_timing_table(&run.timings));

    if let Some(path) = graph_file {
        println!(
            "Graph written to {}",
            THEME.apply(&THEME.path, path.display())
        );
    }
}

fn report_error(error: &PipelineError, format: OutputFormat) -> ExitCode {
    let code = ExitCode::from_error(error);
    if format.is_json() {
        print_json(&JsonResponse::from_error(error).with_meta(ResponseMeta::now(None)));
    } else {
        eprintln!("{}", THEME.error_with_icon(&error.to_string()));
        for suggestion in error.recovery_suggestions() {
            eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
        }
    }
    code
}

fn report_load_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let message = format!("{error:#}");
    if format.is_json() {
        let response: JsonResponse = JsonResponse::from_error(&PipelineError::General(message));
        print_json(&JsonResponse {
            code: "INPUT_ERROR".to_string(),
            exit_code: ExitCode::IoError as u8,
            ..response
        });
    } else {
        eprintln!("{}", THEME.error_with_icon(&message));
    }
    ExitCode::IoError
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize response: {e}"),
    }
}

/// Reads every document named by `paths`, expanding directories one level.
fn load_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceDocument>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("cannot list directory '{}'", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .and_then(|ext| ext.to_str())
                            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        anyhow::bail!("no .txt or .md documents found");
    }

    files
        .iter()
        .map(|file| {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("cannot read document '{}'", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            tracing::debug!(document = %name, bytes = text.len(), "document loaded");
            Ok(SourceDocument::new(name, text))
        })
        .collect()
}

fn load_embeddings(path: &Path) -> anyhow::Result<Vec<EmbeddingVector>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read embeddings '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON array of embeddings", path.display()))
}
