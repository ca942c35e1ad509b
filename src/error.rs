//! Error types for nautilus-tmsu
//!
//! Provides standardized error handling across the extension.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in nautilus-tmsu
#[derive(Debug, Error)]
pub enum TmsuError {
    /// The tmsu executable could not be resolved
    #[error("Command `{0}` is not available on $PATH")]
    NotFound(String),

    /// The external process could not be launched
    #[error("Failed to launch {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external process ran but exited unsuccessfully
    #[error("command failed ({}): {stderr}", exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    /// A command was built without the arguments it requires
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Notification errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TmsuError {
    /// Text suitable for a notification body: the captured stderr for failed
    /// commands, the display form otherwise.
    pub fn detail(&self) -> String {
        match self {
            TmsuError::Failed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Result type alias for nautilus-tmsu operations
pub type TmsuResult<T> = Result<T, TmsuError>;
