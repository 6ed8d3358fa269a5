//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after settings are loaded. Logs go to
//! stderr so JSON output on stdout stays parseable.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::{PipelineError, PipelineResult};

/// Initialise the global tracing subscriber.
///
/// With `prefer_level`, `level` wins and `RUST_LOG` is only a fallback for an
/// invalid level. Otherwise `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> PipelineResult<()> {
    let filter = if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(level_err) => {
                EnvFilter::try_from_default_env().map_err(|env_err| PipelineError::ConfigError {
                    reason: format!(
                        "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                    ),
                })?
            }
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| PipelineError::ConfigError {
                reason: format!("invalid log level '{level}': {e}"),
            })?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| PipelineError::General(format!("failed to set subscriber: {e}")))
}

/// Parse a log level string, rejecting unknown values.
pub fn parse_level(level: &str) -> PipelineResult<LevelFilter> {
    if level.is_empty() {
        return Err(PipelineError::ConfigError {
            reason: "log level must not be empty".into(),
        });
    }
    level.parse::<LevelFilter>().map_err(|_| PipelineError::ConfigError {
        reason: format!("unrecognised log level: '{level}'"),
    })
}
