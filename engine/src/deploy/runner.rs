//! External tool runner

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::errors::EngineError;

/// Output of a successful tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output followed by standard error
    pub combined: String,
}

/// Runs an external command-line tool to completion
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `tool` with `args` inside `working_dir`.
    ///
    /// A non-zero exit is an [`EngineError::ToolFailed`] carrying the
    /// combined output.
    async fn run(&self, tool: &str, args: &[String], working_dir: &Path)
        -> Result<ToolOutput, EngineError>;
}

/// Runs tools as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Per-invocation limit; `None` waits for the tool indefinitely
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(
        &self,
        tool: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<ToolOutput, EngineError> {
        let command_line = command_line(tool, args);
        info!("Running {} in {}", command_line, working_dir.display());

        let child = Command::new(tool)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::ToolSpawn {
                command: command_line.clone(),
                source,
            })?;

        // Dropping the wait future on timeout kills the child
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    error!("{} timed out after {:?}", command_line, limit);
                    EngineError::ToolTimeout {
                        command: command_line.clone(),
                        secs: limit.as_secs(),
                    }
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| EngineError::ToolSpawn {
            command: command_line.clone(),
            source,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            error!("{} failed with status {}", command_line, code);
            debug!("{} output:\n{}", command_line, combined);
            return Err(EngineError::ToolFailed {
                command: command_line,
                code,
                output: combined,
            });
        }

        info!("{} succeeded", command_line);
        debug!("{} output:\n{}", command_line, combined);
        Ok(ToolOutput { combined })
    }
}

/// Human-readable command line for logs and errors
pub fn command_line(tool: &str, args: &[String]) -> String {
    std::iter::once(tool)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
