//! Error types for the snapshot engine
//!
//! Every engine operation reports a single `EngineError`. When several things
//! fail during one run, the first (primary) failure is the one returned.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A snapshot job carries a value the engine refuses to work with
    #[error("Invalid value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// A directory name does not follow `<name>.<interval>.<number>`
    #[error("Invalid generation name '{name}': {reason}")]
    InvalidGenerationName { name: String, reason: String },

    #[error("{stage} snapshot command '{command}' failed: {reason}")]
    HookFailed {
        stage: String,
        command: String,
        reason: String,
    },

    /// External tool exited with a non-zero status
    #[error("Command '{command}' failed (exit code {}): {output}", exit_code_label(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A rename failed part way through the generation shift
    #[error(
        "Failed to move {} to {} after {completed} completed renames: {reason}",
        .from.display(),
        .to.display()
    )]
    RotationFailed {
        from: PathBuf,
        to: PathBuf,
        completed: usize,
        reason: String,
    },

    #[error("Generation {name}.{interval}.{number} not found")]
    GenerationNotFound {
        name: String,
        interval: String,
        number: u32,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl EngineError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        EngineError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by the job definition rather than the run
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig { .. } | EngineError::InvalidGenerationName { .. }
        )
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}
