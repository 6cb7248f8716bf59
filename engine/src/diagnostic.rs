//! Environment self-check behind `--diagnostic`

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::*;

use crate::app::options::AppOptions;
use crate::deploy::runner::{command_line, ToolRunner};
use crate::deploy::ProcessRunner;
use crate::errors::EngineError;
use crate::filesys::dir::Dir;
use crate::utils::version_info;

const VERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Run every check and print a report. Fails with the first failed check.
pub async fn run_diagnostic(options: &AppOptions) -> Result<(), EngineError> {
    let runner = ProcessRunner::new(Some(VERSION_TIMEOUT));
    run_checks(options, &runner).await
}

/// Same as [`run_diagnostic`] with an injected runner
pub async fn run_checks(
    options: &AppOptions,
    runner: &dyn ToolRunner,
) -> Result<(), EngineError> {
    let version = version_info();
    println!(
        "{}",
        format!("landing-zone {} ({})", version.version, version.git_hash).bold()
    );
    println!();

    let tool = check_tool(runner, &options.engine.tool).await;
    report("Infrastructure tool", &tool);

    let deployments = options.storage.deployments_dir();
    let writable = check_writable(&deployments).await;
    report("Deployments directory", &writable);

    let outcome = tool.and(writable).map(|_| ()).map_err(EngineError::from);
    println!();
    match &outcome {
        Ok(()) => println!("{}", "All checks passed.".green()),
        Err(_) => println!("{}", "Some checks failed.".red()),
    }
    outcome
}

fn report(name: &str, outcome: &Result<String>) {
    match outcome {
        Ok(detail) => println!("  {} {:<22} {}", "✓".green(), name, detail.dimmed()),
        Err(e) => println!("  {} {:<22} {}", "✗".red(), name, format!("{:#}", e).red()),
    }
}

async fn check_tool(runner: &dyn ToolRunner, tool: &str) -> Result<String> {
    let args = vec!["version".to_string()];
    let output = runner
        .run(tool, &args, Path::new("."))
        .await
        .with_context(|| format!("`{}` is not usable", command_line(tool, &args)))?;

    Ok(output
        .combined
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no version output")
        .to_string())
}

async fn check_writable(dir: &Dir) -> Result<String> {
    dir.create()
        .await
        .with_context(|| format!("cannot create {}", dir.path().display()))?;

    let marker = dir.file(&format!(".write-check-{}", uuid::Uuid::new_v4()));
    marker
        .write_string("ok")
        .await
        .with_context(|| format!("cannot write to {}", dir.path().display()))?;
    marker
        .delete()
        .await
        .with_context(|| format!("cannot clean up {}", marker.path().display()))?;

    Ok(dir.path().display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::ToolOutput;
    use crate::storage::layout::StorageLayout;
    use async_trait::async_trait;

    struct FixedRunner(Option<&'static str>);

    #[async_trait]
    impl ToolRunner for FixedRunner {
        async fn run(
            &self,
            tool: &str,
            args: &[String],
            _work_dir: &Path,
        ) -> Result<ToolOutput, EngineError> {
            match self.0 {
                Some(text) => Ok(ToolOutput {
                    combined: text.to_string(),
                }),
                None => Err(EngineError::ToolFailed {
                    command: command_line(tool, args),
                    code: "127".to_string(),
                    output: String::new(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_checks_pass() {
        let root = Dir::create_temp_dir("lz-diag").await.unwrap();
        let options = AppOptions {
            storage: StorageLayout::new(root.path()),
            ..Default::default()
        };

        let runner = FixedRunner(Some("\nTerraform v1.9.5\non linux_amd64\n"));
        assert!(run_checks(&options, &runner).await.is_ok());
        assert_eq!(check_tool(&runner, "terraform").await.unwrap(), "Terraform v1.9.5");

        root.delete().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_tool_fails() {
        let root = Dir::create_temp_dir("lz-diag").await.unwrap();
        let options = AppOptions {
            storage: StorageLayout::new(root.path()),
            ..Default::default()
        };

        let err = run_checks(&options, &FixedRunner(None)).await.unwrap_err();
        match err {
            EngineError::Internal(message) => {
                assert!(message.starts_with("`terraform version` is not usable: "));
                assert!(message.contains("exited with status 127"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        root.delete().await.unwrap();
    }
}
