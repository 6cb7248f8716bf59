//! Shared fixtures: a scripted tool runner and sample requests

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use landing_zone::deploy::runner::command_line;
use landing_zone::deploy::{Orchestrator, ToolOutput, ToolRunner};
use landing_zone::errors::EngineError;
use landing_zone::filesys::dir::Dir;
use landing_zone::models::config::DeploymentConfig;

/// One recorded tool call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Stands in for the infrastructure tool. Succeeds by default and can be
/// told to fail, panic or hang on a given subcommand.
#[derive(Default)]
pub struct ScriptedRunner {
    invocations: Mutex<Vec<Invocation>>,
    fail_on: Option<&'static str>,
    panic_once_on: Mutex<Option<&'static str>>,
    stall_on: Option<&'static str>,
    pub stalled: Notify,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(step: &'static str) -> Self {
        Self {
            fail_on: Some(step),
            ..Self::default()
        }
    }

    pub fn panicking_once_on(step: &'static str) -> Self {
        Self {
            panic_once_on: Mutex::new(Some(step)),
            ..Self::default()
        }
    }

    pub fn stalling_on(step: &'static str) -> Self {
        Self {
            stall_on: Some(step),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// First argument of every call, in call order
    pub fn subcommands(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .map(|i| i.args.first().cloned().unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(
        &self,
        tool: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<ToolOutput, EngineError> {
        let step = args.first().cloned().unwrap_or_default();
        self.invocations.lock().unwrap().push(Invocation {
            tool: tool.to_string(),
            args: args.to_vec(),
            working_dir: working_dir.to_path_buf(),
        });

        let explode = {
            let mut panic_on = self.panic_once_on.lock().unwrap();
            if *panic_on == Some(step.as_str()) {
                panic_on.take();
                true
            } else {
                false
            }
        };
        if explode {
            panic!("runner exploded during {}", step);
        }

        if self.stall_on == Some(step.as_str()) {
            self.stalled.notify_one();
            std::future::pending::<()>().await;
        }

        if self.fail_on == Some(step.as_str()) {
            return Err(EngineError::ToolFailed {
                command: command_line(tool, args),
                code: "1".to_string(),
                output: format!("Error: {} rejected the configuration", step),
            });
        }

        Ok(ToolOutput {
            combined: format!("{} ok\n", step),
        })
    }
}

/// Orchestrator over a fresh temporary deployments root
pub async fn orchestrator(runner: Arc<ScriptedRunner>) -> (Arc<Orchestrator>, Dir) {
    let root = Dir::create_temp_dir("lz-it").await.unwrap();
    let orchestrator = Orchestrator::new(runner, root.subdir("deployments"));
    (Arc::new(orchestrator), root)
}

pub fn sample_request() -> serde_json::Value {
    json!({
        "cloudProvider": "aws",
        "region": "us-east-1",
        "az": "us-east-1a",
        "vpc": {"name": "main", "cidr": "10.0.0.0/16"},
        "allSubnets": [
            {"name": "public", "cidr": "10.0.1.0/24", "mapPublicIpOnLaunch": true},
            {"name": "private", "cidr": "10.0.2.0/24", "az": "us-east-1b"}
        ],
        "components": [
            {"value": "load-balancer", "name": "web"},
            "object-storage"
        ]
    })
}

pub fn sample_config() -> DeploymentConfig {
    serde_json::from_value(sample_request()).unwrap()
}
