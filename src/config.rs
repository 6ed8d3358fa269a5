//! Configuration module for the knowledge-graph pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `KG_` and use double underscores
//! to separate nested levels:
//! - `KG_CLUSTERING__THREADS=8` sets `clustering.threads`
//! - `KG_EMBEDDING__MODEL=sentence-bert` sets `embedding.model`
//! - `KG_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::pipeline::cache::DEFAULT_CACHE_CAPACITY;
use crate::vector::{DEFAULT_MAX_ITERATIONS, DEFAULT_PARALLEL_THRESHOLD};

/// Directory holding the settings file, searched upwards from the current directory.
pub const CONFIG_DIR: &str = ".knowgraph";

const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .knowgraph is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level or `tracing` filter directive, e.g. `info` or `knowgraph=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Shorter parts are dropped
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Longer parts are subdivided
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Target size of each subdivision
    #[serde(default = "default_sub_chunk_chars")]
    pub sub_chunk_chars: usize,

    /// Block size used when a document has too few paragraph breaks
    #[serde(default = "default_fallback_block_chars")]
    pub fallback_block_chars: usize,

    /// Single-part documents above this size are split on sentences
    #[serde(default = "default_sentence_split_chars")]
    pub sentence_split_chars: usize,
}

/// Local embedding model profile.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingModel {
    /// Universal Sentence Encoder profile, 512 dimensions
    #[default]
    Use,
    /// Sentence-BERT profile, 768 dimensions
    SentenceBert,
}

impl EmbeddingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Use => "use",
            Self::SentenceBert => "sentence-bert",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub model: EmbeddingModel,

    /// Keywords extracted for chunks that carry none (0 disables extraction)
    #[serde(default = "default_keywords_per_chunk")]
    pub keywords_per_chunk: usize,

    /// Embeddings memoised per pipeline (0 disables the cache)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Fixed cluster count; chosen from the input size when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Inputs at least this large assign points in parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Worker threads for the parallel assignment step
    #[serde(default = "default_threads")]
    pub threads: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_min_chunk_chars() -> usize {
    3
}
fn default_max_chunk_chars() -> usize {
    1800
}
fn default_sub_chunk_chars() -> usize {
    1200
}
fn default_fallback_block_chars() -> usize {
    1000
}
fn default_sentence_split_chars() -> usize {
    1500
}
fn default_keywords_per_chunk() -> usize {
    5
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}
fn default_threads() -> usize {
    num_cpus::get()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            logging: LoggingConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
            sub_chunk_chars: default_sub_chunk_chars(),
            fallback_block_chars: default_fallback_block_chars(),
            sentence_split_chars: default_sentence_split_chars(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::default(),
            keywords_per_chunk: default_keywords_per_chunk(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            k: None,
            max_iterations: default_max_iterations(),
            parallel_threshold: default_parallel_threshold(),
            threads: default_threads(),
        }
    }
}

/// `KG_` variables, with `__` separating nested keys.
fn env_provider() -> Env {
    Env::prefixed("KG_").map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the settings file by looking for a .knowgraph directory
    /// from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .knowgraph is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'knowgraph init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create the settings file under `root`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# knowgraph configuration file

# Version of the configuration schema
version = 1

[logging]
# Default log level: error, warn, info, debug or trace
# RUST_LOG overrides this unless --log-level is given
level = "warn"

[chunking]
# Parts shorter than this many characters are dropped
min_chunk_chars = 3

# Parts longer than this are split into sub-chunks
max_chunk_chars = 1800

# Target size of each sub-chunk
sub_chunk_chars = 1200

# Block size used when a document has fewer than 3 paragraphs
fallback_block_chars = 1000

# Single-paragraph documents above this size are split on sentences
sentence_split_chars = 1500

[embedding]
# Local model profile: "use" (512 dims) or "sentence-bert" (768 dims)
model = "use"

# Keywords extracted for chunks without any (0 disables)
keywords_per_chunk = 5

# Embeddings memoised per run (0 disables the cache)
cache_capacity = {cache}

[clustering]
# Fixed number of clusters (defaults to ceil(sqrt(n / 2)) clamped to 2..=10)
# k = 4

# Upper bound on K-Means iterations
max_iterations = {iterations}

# Inputs with at least this many vectors assign clusters in parallel
parallel_threshold = {threshold}

# Worker threads for parallel assignment (defaults to CPU count)
# threads = {threads}
"#,
            cache = DEFAULT_CACHE_CAPACITY,
            iterations = DEFAULT_MAX_ITERATIONS,
            threshold = DEFAULT_PARALLEL_THRESHOLD,
            threads = num_cpus::get(),
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
