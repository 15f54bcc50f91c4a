// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
///
/// Every variant here is fatal for a run. Per-candidate skips and per-clip
/// encode failures are carried as values (`Measured::Unavailable`,
/// `JobState::Failed`) and never surface through this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),
    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Input folder contains nothing selectable
    #[error("No video files found in {0}")]
    EmptyInput(String),
    /// External tool missing or not runnable
    #[error("Required tool unavailable: {0}")]
    ToolUnavailable(String),
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The shared common clip could not be re-encoded
    #[error("Failed to re-encode common clip {path}. See {log}")]
    CommonClipFailed { path: String, log: String },
    /// Every clip failed, so there is nothing to concatenate
    #[error("No segments were produced; nothing to assemble")]
    NothingToAssemble,
    /// The final concatenation step failed
    #[error("Failed to concatenate videos. See {log}")]
    ConcatFailed { log: String },
    /// Caller cancelled the run
    #[error("Run cancelled")]
    Cancelled,
    /// Filesystem operation failed
    #[error("Filesystem error: {0}")]
    FsFail(String),
    /// Internal invariant violated
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Wrap an I/O error with a short description of what was attempted
    pub fn fs(action: &str, err: std::io::Error) -> Self {
        DomainError::FsFail(format!("{}: {}", action, err))
    }
}

/// Failure to turn a loudness analysis report into `LoudnessStats`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoudnessParseError {
    /// A required measurement was not present in the report
    #[error("loudness report is missing '{0}'")]
    MissingField(&'static str),
    /// A measurement was present but not a finite number
    #[error("loudness report has invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },
}
