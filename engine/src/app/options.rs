//! Application options

use std::time::Duration;

use crate::deploy::orchestrator::DEFAULT_TOOL;
use crate::deploy::terraform::DEFAULT_PLAN_FILE;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;

/// Application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// HTTP server configuration
    pub server: ServerOptions,

    /// Deployment engine configuration
    pub engine: EngineOptions,

    /// Storage layout paths
    pub storage: StorageLayout,
}

impl AppOptions {
    /// Build options from loaded settings and the resolved storage layout
    pub fn from_settings(settings: &Settings, storage: StorageLayout) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            engine: EngineOptions {
                tool: settings.terraform.binary.clone(),
                plan_file: settings.terraform.plan_file.clone(),
                step_timeout: settings.terraform.step_timeout_secs.map(Duration::from_secs),
            },
            storage,
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Deployment engine options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Infrastructure tool binary
    pub tool: String,

    /// Plan artifact written by plan and read by apply
    pub plan_file: String,

    /// Limit on each tool invocation
    pub step_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            plan_file: DEFAULT_PLAN_FILE.to_string(),
            step_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_settings() {
        let mut settings = Settings::default();
        settings.server.port = 9000;
        settings.terraform.binary = "tofu".to_string();
        settings.terraform.step_timeout_secs = Some(120);

        let options = AppOptions::from_settings(&settings, StorageLayout::new("/srv/lz"));
        assert_eq!(options.server.port, 9000);
        assert_eq!(options.engine.tool, "tofu");
        assert_eq!(options.engine.plan_file, "tfplan");
        assert_eq!(options.engine.step_timeout, Some(Duration::from_secs(120)));
        assert_eq!(options.storage.base_dir, std::path::PathBuf::from("/srv/lz"));
    }
}
