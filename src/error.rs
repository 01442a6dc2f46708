use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur while running git
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to execute {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level error for the command-line front end
///
/// Library code only ever returns `GitError` or `ConfigError`; this enum
/// gathers them for `main` together with output failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
