//! Exit codes for CLI operations, following Unix conventions.
//!
//! - `0`: success
//! - `1`: unspecified failure
//! - `2`: blocking error, automation should halt
//! - `3-125`: specific recoverable errors

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Broken invariant between stages; results cannot be trusted
    BlockingError = 2,
    /// Input produced nothing to process
    EmptyInput = 3,
    /// Input could not be parsed
    InvalidInput = 4,
    IoError = 5,
    ConfigError = 6,
    /// Clustering could not run with the requested parameters
    ClusteringError = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Maps a pipeline error to the code scripts can branch on.
    pub fn from_error(error: &PipelineError) -> Self {
        match error {
            PipelineError::EmptyInput { .. } => ExitCode::EmptyInput,
            PipelineError::Validation(_) => ExitCode::BlockingError,
            PipelineError::Serialization { .. } | PipelineError::Embedding(_) => {
                ExitCode::InvalidInput
            }
            PipelineError::FileRead { .. } | PipelineError::FileWrite { .. } => ExitCode::IoError,
            PipelineError::ConfigError { .. } => ExitCode::ConfigError,
            PipelineError::Clustering(_) => ExitCode::ClusteringError,
            PipelineError::General(_) => ExitCode::GeneralError,
        }
    }

    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::EmptyInput => "Empty input",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::ClusteringError => "Clustering error",
        }
    }
}
