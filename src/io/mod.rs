//! CLI output plumbing: text or JSON responses and process exit codes.

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::{ErrorDetails, JsonResponse, OutputFormat, ResponseMeta, format_utc_timestamp};
