//! Deployment and launch status models

use serde::{Deserialize, Serialize};

/// Cluster-reported client status of an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Pending,
    Running,
    Failed,
    Lost,
    Complete,
    Dead,
    Unrecognized,
}

impl ClientStatus {
    /// Parse the raw status string reported by Nomad
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => ClientStatus::Pending,
            "running" => ClientStatus::Running,
            "failed" => ClientStatus::Failed,
            "lost" => ClientStatus::Lost,
            "complete" => ClientStatus::Complete,
            "dead" => ClientStatus::Dead,
            _ => ClientStatus::Unrecognized,
        }
    }
}

/// Aggregate state of a long-running app deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    /// No job known to the scheduler under this id
    Unknown,

    /// All instances are still starting
    Deploying,

    /// All instances are running
    Deployed,

    /// All instances failed, or the job died without ever scheduling
    Failed,

    /// Some instances healthy, some not; a first-class state, not an error
    Partial,

    /// Explicitly deregistered
    Undeployed,
}

/// State of a single app instance, folded from its allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Starting,
    Running,
    Failed,
    Complete,
    Unknown,
}

/// State of a one-shot task launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchState {
    Unknown,
    Launching,
    Running,
    Complete,
    Failed,
}

/// Status of a single app instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatus {
    /// Allocation id, or the deployment id when no allocation exists
    pub id: String,

    /// Node the allocation was placed on; absent for synthetic entries
    pub node_id: Option<String>,

    pub state: InstanceState,
}

/// Aggregate status of a long-running app deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStatus {
    pub deployment_id: String,

    pub state: DeploymentState,

    /// Per-instance detail, one entry per allocation
    pub instances: Vec<InstanceStatus>,
}

/// Status of a one-shot task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,

    pub state: LaunchState,
}
