//! Error types for the landing zone engine

use thiserror::Error;

/// Main error type for the landing zone engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The deployment request was rejected before any work was scheduled
    #[error("Invalid deployment configuration: {0}")]
    InvalidConfig(String),

    #[error("Filesystem error: {0}")]
    FilesystemError(String),

    #[error("Failed to run {command}: {source}")]
    ToolSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully
    #[error("{command} exited with status {code}, output: {output}")]
    ToolFailed {
        command: String,
        code: String,
        output: String,
    },

    #[error("{command} timed out after {secs}s")]
    ToolTimeout { command: String, secs: u64 },

    #[error("Deployment error: {0}")]
    DeployError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Combined tool output attached to this error, if any
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            EngineError::ToolFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(format!("{:#}", err))
    }
}
