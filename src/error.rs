//! Error types for the knowledge-graph pipeline
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages. Stage-specific errors live
//! next to their stage ([`ClusteringError`], [`ValidationError`],
//! [`VectorError`]) and convert into [`PipelineError`].

use crate::pipeline::{PipelineStage, ValidationError};
use crate::vector::{ClusteringError, VectorError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pipeline runs
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Clustering failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] VectorError),

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize {what}: {source}")]
    Serialization {
        what: String,
        source: serde_json::Error,
    },

    #[error("Nothing to process at the {stage} stage\nSuggestion: Check that the input documents contain text")]
    EmptyInput { stage: PipelineStage },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// General errors for context attached with [`ErrorContext`]
    #[error("{0}")]
    General(String),
}

impl PipelineError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Clustering(_) => "CLUSTERING_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::EmptyInput { .. } => "EMPTY_INPUT",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Clustering(ClusteringError::DimensionMismatch { .. }) => vec![
                "Regenerate all embeddings with the same model",
                "Check the input JSON for truncated vectors",
            ],
            Self::Clustering(_) => vec!["Omit --k to let the cluster count be chosen automatically"],
            Self::Validation(_) => vec![
                "Run with --log-level debug to see which records failed",
                "Check that every embedding id matches a chunk id",
            ],
            Self::Embedding(_) => vec![
                "Check the embedding model setting in .knowgraph/settings.toml",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Only UTF-8 text files are supported",
            ],
            Self::FileWrite { .. } => vec![
                "Check that the output directory exists and is writable",
            ],
            Self::Serialization { .. } => vec![
                "Check that the input is a JSON array of embedding records",
            ],
            Self::EmptyInput { .. } => vec![
                "Provide at least one non-empty document",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'knowgraph init --force' to regenerate the configuration",
            ],
            Self::General(_) => vec![],
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T, PipelineError>;

    /// Add context with a path
    fn with_path(self, path: &std::path::Path) -> Result<T, PipelineError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, PipelineError> {
        self.map_err(|e| {
            PipelineError::General(format!("Error processing '{}': {}", path.display(), e))
        })
    }
}
