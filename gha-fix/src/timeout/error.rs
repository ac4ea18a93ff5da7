//! Timeout fixer error types.

use thiserror::Error;

/// Errors that abort adding timeouts to a file.
///
/// The file is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError {
    /// No job property follows the job key, so its indentation is unknown.
    #[error("could not calculate indent for timeout-minutes line after line {line}")]
    IndentNotCalculated { line: usize },

    /// A job body is written as a flow mapping.
    #[error("flow style YAML is not supported for job definitions")]
    FlowStyleNotSupported,

    /// A job name is glued to its first property (`job:runs-on: ...`).
    #[error("compact job syntax (job_name: {{ ... }}) is not supported, please use regular YAML syntax")]
    CompactJobSyntaxNotSupported,

    /// The configured timeout is zero.
    #[error("timeout value must be greater than 0")]
    InvalidTimeout,
}
