//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::EngineError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to a daily file under the logs directory
    #[serde(default = "default_true")]
    pub log_to_file: bool,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// External tool configuration
    #[serde(default)]
    pub terraform: TerraformSettings,

    /// Overrides the storage base directory
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: true,
            server: ServerSettings::default(),
            terraform: TerraformSettings::default(),
            storage_dir: None,
        }
    }
}

impl Settings {
    /// Read settings from `file`, falling back to defaults when it does not exist
    pub async fn load(file: &File) -> Result<Self, EngineError> {
        if !file.exists().await {
            info!("No settings file at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }

        file.read_json().await.map_err(|e| {
            EngineError::ConfigError(format!(
                "Unable to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_vars(&mut self) -> Result<(), EngineError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`: `PORT`, `LOG_LEVEL`,
    /// `LZ_TERRAFORM_BIN` and `LZ_STORAGE_DIR`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| EngineError::ConfigError(format!("Invalid PORT: {}", port)))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.parse().map_err(EngineError::ConfigError)?;
        }
        if let Some(binary) = lookup("LZ_TERRAFORM_BIN") {
            self.terraform.binary = binary;
        }
        if let Some(dir) = lookup("LZ_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// External tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerraformSettings {
    /// Binary name or path
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Per-step limit; unset waits indefinitely
    #[serde(default)]
    pub step_timeout_secs: Option<u64>,

    /// Plan artifact shared by plan and apply
    #[serde(default = "default_plan_file")]
    pub plan_file: String,
}

fn default_binary() -> String {
    "terraform".to_string()
}

fn default_plan_file() -> String {
    "tfplan".to_string()
}

impl Default for TerraformSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            step_timeout_secs: None,
            plan_file: default_plan_file(),
        }
    }
}
