//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::deploy::{Orchestrator, ProcessRunner};
use crate::errors::EngineError;
use crate::server::serve::serve;
use crate::server::state::ServerState;

/// Run the engine until `shutdown_signal` resolves
pub async fn run(
    version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), EngineError> {
    info!("Initializing landing zone engine {}...", version);

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);

    options.storage.setup().await?;
    let orchestrator = Arc::new(init_orchestrator(&options));
    let mut shutdown_manager = ShutdownManager::new(
        shutdown_tx.clone(),
        options.lifecycle.clone(),
        orchestrator.clone(),
    );

    if let Err(e) = init_server(
        &options,
        orchestrator,
        &mut shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await
    {
        error!("Failed to start engine: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

fn init_orchestrator(options: &AppOptions) -> Orchestrator {
    let runner = Arc::new(ProcessRunner::new(options.engine.step_timeout));
    info!(
        "Deployments under {} using {}",
        options.storage.deployments_dir().path().display(),
        options.engine.tool
    );

    Orchestrator::new(runner, options.storage.deployments_dir())
        .with_tool(options.engine.tool.clone())
        .with_plan_file(options.engine.plan_file.clone())
}

async fn init_server(
    options: &AppOptions,
    orchestrator: Arc<Orchestrator>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), EngineError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(orchestrator);
    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    orchestrator: Arc<Orchestrator>,
    server_handle: Option<JoinHandle<Result<(), EngineError>>>,
}

impl ShutdownManager {
    fn new(
        shutdown_tx: broadcast::Sender<()>,
        lifecycle_options: LifecycleOptions,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            orchestrator,
            server_handle: None,
        }
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), EngineError>>,
    ) -> Result<(), EngineError> {
        if self.server_handle.is_some() {
            return Err(EngineError::Internal("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}",
                    self.lifecycle_options.max_shutdown_delay
                );
                Err(EngineError::ServerError("shutdown timed out".to_string()))
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), EngineError> {
        info!("Shutting down landing zone engine...");

        if self.orchestrator.cancel() {
            warn!("In-flight deployment was cancelled by shutdown");
        }

        if let Some(handle) = self.server_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(e) => error!("HTTP server task failed: {}", e),
            }
        }

        info!("Landing zone engine shut down");
        Ok(())
    }
}
