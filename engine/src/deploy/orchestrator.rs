//! Deployment orchestrator
//!
//! Owns the single [`DeploymentStatus`] and runs one background pipeline
//! per [`Orchestrator::start`]: generate the document, then init, validate,
//! plan and apply, then build the topology.
//!
//! Starting a run while another is in flight does not stop the older one.
//! Each status update carries the id of the run that produced it and is
//! dropped unless that run still owns the status, so the status always
//! reflects the most recently started run.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::deploy::fsm::DeploymentEvent;
use crate::deploy::runner::{command_line, ToolRunner};
use crate::deploy::terraform::{LifecycleStep, DEFAULT_PLAN_FILE};
use crate::errors::EngineError;
use crate::filesys::dir::Dir;
use crate::generator::Generator;
use crate::models::config::DeploymentConfig;
use crate::models::status::{DeploymentResult, DeploymentStatus};
use crate::topology::build_topology;

/// Name of the generated document inside a deployment's working directory
pub const DOCUMENT_FILE: &str = "main.tf";

pub const DEFAULT_TOOL: &str = "terraform";

/// Deployment orchestrator
pub struct Orchestrator {
    status: Mutex<DeploymentStatus>,
    runner: Arc<dyn ToolRunner>,
    generator: Generator,
    deployments: Dir,
    tool: String,
    plan_file: String,
    last_id: AtomicI64,
    task: Mutex<Option<RunHandle>>,
}

/// Background pipeline of the most recently started run
struct RunHandle {
    deployment_id: String,
    handle: JoinHandle<()>,
}

impl Orchestrator {
    /// Create an orchestrator writing working directories under `deployments`
    pub fn new(runner: Arc<dyn ToolRunner>, deployments: Dir) -> Self {
        Self {
            status: Mutex::new(DeploymentStatus::idle()),
            runner,
            generator: Generator::default(),
            deployments,
            tool: DEFAULT_TOOL.to_string(),
            plan_file: DEFAULT_PLAN_FILE.to_string(),
            last_id: AtomicI64::new(0),
            task: Mutex::new(None),
        }
    }

    /// Use a different tool binary
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_plan_file(mut self, plan_file: impl Into<String>) -> Self {
        self.plan_file = plan_file.into();
        self
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    pub fn deployments_dir(&self) -> &Dir {
        &self.deployments
    }

    /// Validate `config`, take over the status and schedule the pipeline.
    ///
    /// Returns the new deployment id without waiting for any step. Must be
    /// called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>, config: DeploymentConfig) -> Result<String, EngineError> {
        config.validate()?;

        // Id allocation, takeover and handle store share one critical section
        // so the retained handle always belongs to the run owning the status
        let mut status = self.lock_status();
        let deployment_id = self.next_deployment_id();
        info!(
            "Starting deployment {} ({} in {})",
            deployment_id, config.cloud_provider, config.region
        );

        status
            .process(DeploymentEvent::Start {
                deployment_id: deployment_id.clone(),
                message: format!("Starting deployment {}", deployment_id),
            })
            .map_err(EngineError::DeployError)?;

        let this = Arc::clone(self);
        let run_id = deployment_id.clone();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(this.run_pipeline(&run_id, &config))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => info!("Deployment {} completed", run_id),
                Ok(Err(e)) => {
                    let reason = failure_message(&e);
                    error!("Deployment {} failed: {}", run_id, reason);
                    this.update(&run_id, DeploymentEvent::Fail(reason));
                }
                Err(panic) => {
                    let reason = format!("Unexpected fault: {}", panic_message(panic.as_ref()));
                    error!("Deployment {} aborted: {}", run_id, reason);
                    this.update(&run_id, DeploymentEvent::Fail(reason));
                }
            }
        });

        // An older run's handle is dropped here; that run keeps going detached
        *self.lock_task() = Some(RunHandle {
            deployment_id: deployment_id.clone(),
            handle,
        });
        drop(status);
        Ok(deployment_id)
    }

    /// Snapshot of the current status
    pub fn query_status(&self) -> DeploymentStatus {
        self.lock_status().clone()
    }

    /// Abort the most recently started run if it is still in flight.
    ///
    /// Returns whether a run was cancelled.
    pub fn cancel(&self) -> bool {
        let run = self.lock_task().take();
        let Some(run) = run else {
            return false;
        };
        if run.handle.is_finished() {
            return false;
        }

        warn!("Cancelling deployment {}", run.deployment_id);
        run.handle.abort();
        self.update(
            &run.deployment_id,
            DeploymentEvent::Fail("Deployment cancelled".to_string()),
        );
        true
    }

    /// Wait for the most recently started run to finish
    pub async fn wait(&self) {
        let run = self.lock_task().take();
        if let Some(run) = run {
            if let Err(e) = run.handle.await {
                if !e.is_cancelled() {
                    error!("Deployment task ended abnormally: {}", e);
                }
            }
        }
    }

    /// Time-derived id, strictly greater than every id handed out before
    fn next_deployment_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1).to_string()
    }

    fn lock_status(&self) -> MutexGuard<'_, DeploymentStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<RunHandle>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `event` if `deployment_id` still owns the status
    fn update(&self, deployment_id: &str, event: DeploymentEvent) -> bool {
        let mut status = self.lock_status();
        if !status.is_owned_by(deployment_id) {
            debug!("Discarding update from superseded deployment {}", deployment_id);
            return false;
        }
        match status.process(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Deployment {}: {}", deployment_id, e);
                false
            }
        }
    }

    fn log(&self, deployment_id: &str, entry: impl Into<String>) {
        self.update(deployment_id, DeploymentEvent::Log(entry.into()));
    }

    fn advance(&self, deployment_id: &str, progress: u8, message: impl Into<String>) {
        self.update(
            deployment_id,
            DeploymentEvent::Advance {
                progress,
                message: message.into(),
            },
        );
    }

    async fn run_pipeline(
        &self,
        deployment_id: &str,
        config: &DeploymentConfig,
    ) -> Result<(), EngineError> {
        let work_dir = self.deployments.subdir(deployment_id);
        work_dir.create().await.map_err(|e| {
            EngineError::FilesystemError(format!(
                "Failed to create working directory {}: {}",
                work_dir.path().display(),
                e
            ))
        })?;
        self.log(
            deployment_id,
            format!("Created working directory {}", work_dir.path().display()),
        );

        let document = self.generator.generate(config);
        for warning in &document.warnings {
            self.log(deployment_id, format!("Warning: {}", warning));
        }
        let document_file = work_dir.file(DOCUMENT_FILE);
        document_file
            .write_string(&document.text)
            .await
            .map_err(|e| {
                EngineError::FilesystemError(format!(
                    "Failed to write {}: {}",
                    document_file.path().display(),
                    e
                ))
            })?;
        debug!("Generated document for {}:\n{}", deployment_id, document.text);

        let mut progress = 10;
        self.advance(deployment_id, progress, "Terraform configuration generated");
        self.log(
            deployment_id,
            format!("Wrote Terraform configuration to {}", document_file.path().display()),
        );

        for step in LifecycleStep::ORDER {
            if let Some(before) = step.progress_before() {
                progress = before;
            }
            self.advance(deployment_id, progress, step.running_message());

            let args = step.args(&self.plan_file);
            let command = command_line(&self.tool, &args);
            self.log(deployment_id, format!("Running {}", command));

            let output = match self.runner.run(&self.tool, &args, work_dir.path()).await {
                Ok(output) => output,
                Err(e) => {
                    if let Some(output) = e.tool_output().map(str::trim_end).filter(|o| !o.is_empty()) {
                        self.log(deployment_id, format!("{} output:\n{}", command, output));
                    }
                    return Err(EngineError::DeployError(format!(
                        "Terraform {} failed: {}",
                        step.name(),
                        e
                    )));
                }
            };
            let combined = output.combined.trim_end();
            if !combined.is_empty() {
                self.log(deployment_id, format!("{} output:\n{}", command, combined));
            }
            self.log(deployment_id, step.success_message());

            progress = step.progress_after();
            if step == LifecycleStep::Apply {
                self.update(
                    deployment_id,
                    DeploymentEvent::Deploy {
                        progress,
                        message: "Terraform apply completed, building topology".to_string(),
                    },
                );
            } else {
                self.advance(deployment_id, progress, step.success_message());
            }
        }

        let topology = build_topology(config);
        self.log(
            deployment_id,
            format!(
                "Topology built with {} nodes and {} edges",
                topology.nodes.len(),
                topology.edges.len()
            ),
        );

        let result = DeploymentResult {
            deployment_id: deployment_id.to_string(),
            cloud_provider: config.cloud_provider.clone(),
            region: config.region.clone(),
            az: config.az.clone(),
            vpcs: config.networks().into_iter().cloned().collect(),
            subnets: config.subnets().into_iter().cloned().collect(),
            components: config.components.clone(),
            terraform_path: document_file.path().display().to_string(),
        };
        self.update(
            deployment_id,
            DeploymentEvent::Complete {
                message: "Deployment completed successfully".to_string(),
                result: Box::new(result),
                topology,
            },
        );

        Ok(())
    }
}

fn failure_message(err: &EngineError) -> String {
    match err {
        EngineError::DeployError(message) | EngineError::FilesystemError(message) => {
            message.clone()
        }
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
