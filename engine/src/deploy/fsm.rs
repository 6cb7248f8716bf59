//! Finite State Machine for deployment status

use crate::models::status::{DeploymentPhase, DeploymentResult, DeploymentStatus};
use crate::models::topology::Topology;

/// Progress value once a run has completed
pub const COMPLETE_PROGRESS: u8 = 100;

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// A new run takes over the status, from any phase
    Start { deployment_id: String, message: String },

    /// A step finished; progress may not move backwards
    Advance { progress: u8, message: String },

    /// Append to the run's log
    Log(String),

    /// Apply succeeded and the run moves past the preparing phase
    Deploy { progress: u8, message: String },

    /// Deployment completed successfully
    Complete {
        message: String,
        result: Box<DeploymentResult>,
        topology: Topology,
    },

    /// Deployment failed; progress stays at the last successful value
    Fail(String),
}

impl DeploymentStatus {
    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<(), String> {
        let current = self.status;
        let new_state = match (current, event) {
            // Any phase may be replaced by a new run
            (_, DeploymentEvent::Start { deployment_id, message }) => {
                self.deployment_id = Some(deployment_id);
                self.progress = 0;
                self.logs = vec![message.clone()];
                self.message = message;
                self.result = None;
                self.topology = None;
                DeploymentPhase::Preparing
            }

            (state, DeploymentEvent::Advance { progress, message }) if state.is_running() => {
                self.raise_progress(progress)?;
                self.message = message;
                state
            }

            (state, DeploymentEvent::Log(entry)) if state != DeploymentPhase::Idle => {
                self.logs.push(entry);
                state
            }

            (DeploymentPhase::Preparing, DeploymentEvent::Deploy { progress, message }) => {
                self.raise_progress(progress)?;
                self.message = message;
                DeploymentPhase::Deploying
            }

            (
                DeploymentPhase::Deploying,
                DeploymentEvent::Complete {
                    message,
                    result,
                    topology,
                },
            ) => {
                self.progress = COMPLETE_PROGRESS;
                self.message = message;
                self.result = Some(*result);
                self.topology = Some(topology);
                DeploymentPhase::Completed
            }

            (state, DeploymentEvent::Fail(reason)) if state.is_running() => {
                self.message = reason.clone();
                self.logs.push(reason);
                DeploymentPhase::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.status = new_state;
        Ok(())
    }

    fn raise_progress(&mut self, progress: u8) -> Result<(), String> {
        if progress < self.progress || progress > COMPLETE_PROGRESS {
            return Err(format!(
                "Invalid progress update: {} -> {}",
                self.progress, progress
            ));
        }
        self.progress = progress;
        Ok(())
    }
}
