//! Deployment status models

use serde::{Deserialize, Serialize};

use crate::models::config::{ComponentSelection, Subnet, Vpc};
use crate::models::topology::Topology;

/// Coarse-grained stage of one deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentPhase {
    /// No deployment has started yet
    #[default]
    Idle,

    /// Generating the document and running init/validate/plan/apply
    Preparing,

    /// Apply succeeded, building the topology
    Deploying,

    /// Finished successfully
    Completed,

    /// Stopped at a failed step
    Failed,
}

impl DeploymentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentPhase::Completed | DeploymentPhase::Failed)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, DeploymentPhase::Preparing | DeploymentPhase::Deploying)
    }
}

/// Snapshot of the most recent deployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Lifecycle phase
    pub status: DeploymentPhase,

    /// Progress percentage in [0, 100]
    pub progress: u8,

    /// Human-readable message
    pub message: String,

    /// Cumulative log entries for the current run
    pub logs: Vec<String>,

    /// Summary of a completed deployment
    pub result: Option<DeploymentResult>,

    /// Topology of a completed deployment
    pub topology: Option<Topology>,

    /// Run that currently owns this status
    #[serde(skip)]
    pub deployment_id: Option<String>,
}

impl DeploymentStatus {
    /// Status before any deployment has run
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether `deployment_id` is the run that currently owns this status
    pub fn is_owned_by(&self, deployment_id: &str) -> bool {
        self.deployment_id.as_deref() == Some(deployment_id)
    }
}

/// Summary attached to a completed deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub deployment_id: String,
    pub cloud_provider: String,
    pub region: String,
    pub az: String,
    pub vpcs: Vec<Vpc>,
    pub subnets: Vec<Subnet>,
    pub components: Vec<ComponentSelection>,

    /// Where the generated document was written
    pub terraform_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_status_serialization() {
        let json = serde_json::to_value(DeploymentStatus::idle()).unwrap();

        assert_eq!(json["status"], "idle");
        assert_eq!(json["progress"], 0);
        assert_eq!(json["logs"], serde_json::json!([]));
        assert!(json["result"].is_null());
        assert!(json["topology"].is_null());
        assert!(json.get("deployment_id").is_none());
    }

    #[test]
    fn test_phase_predicates() {
        assert!(DeploymentPhase::Completed.is_terminal());
        assert!(DeploymentPhase::Failed.is_terminal());
        assert!(!DeploymentPhase::Idle.is_terminal());
        assert!(DeploymentPhase::Deploying.is_running());
        assert!(!DeploymentPhase::Idle.is_running());
    }
}
