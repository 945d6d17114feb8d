//! Status reconciliation
//!
//! Folds cluster-reported allocation state into the deployment-level and
//! per-instance status model. The allocation-status mapping is a fixed
//! table shared by the app and task reconcilers.

use crate::models::job::{Allocation, AllocationListStub};
use crate::models::status::{
    AppStatus, ClientStatus, DeploymentState, InstanceState, InstanceStatus, LaunchState,
    TaskStatus,
};

/// Map a cluster status onto an app instance state
pub fn instance_state(status: ClientStatus) -> InstanceState {
    match status {
        ClientStatus::Pending => InstanceState::Starting,
        ClientStatus::Running => InstanceState::Running,
        ClientStatus::Failed | ClientStatus::Lost => InstanceState::Failed,
        ClientStatus::Complete | ClientStatus::Dead => InstanceState::Complete,
        ClientStatus::Unrecognized => InstanceState::Unknown,
    }
}

/// Map a cluster status onto a one-shot launch state
pub fn launch_state(status: ClientStatus) -> LaunchState {
    match status {
        ClientStatus::Pending => LaunchState::Launching,
        ClientStatus::Running => LaunchState::Running,
        ClientStatus::Failed | ClientStatus::Lost => LaunchState::Failed,
        ClientStatus::Complete | ClientStatus::Dead => LaunchState::Complete,
        ClientStatus::Unrecognized => LaunchState::Unknown,
    }
}

/// Fold a job's allocations into an aggregate app status
pub fn app_status_from_allocations(deployment_id: &str, allocations: &[Allocation]) -> AppStatus {
    let instances: Vec<InstanceStatus> = allocations
        .iter()
        .map(|allocation| InstanceStatus {
            id: allocation.id.clone(),
            node_id: (!allocation.node_id.is_empty()).then(|| allocation.node_id.clone()),
            state: instance_state(ClientStatus::parse(&allocation.client_status)),
        })
        .collect();

    AppStatus {
        deployment_id: deployment_id.to_string(),
        state: aggregate_state(&instances),
        instances,
    }
}

/// Derive the deployment state from the instance statuses
pub fn aggregate_state(instances: &[InstanceStatus]) -> DeploymentState {
    if instances.is_empty() {
        return DeploymentState::Unknown;
    }
    if instances.iter().all(|i| i.state == InstanceState::Running) {
        return DeploymentState::Deployed;
    }
    if instances.iter().all(|i| i.state == InstanceState::Failed) {
        return DeploymentState::Failed;
    }
    if instances.iter().all(|i| i.state == InstanceState::Starting) {
        return DeploymentState::Deploying;
    }
    DeploymentState::Partial
}

/// Status of an app whose id is not known to the scheduler
pub fn unknown_app_status(deployment_id: &str) -> AppStatus {
    AppStatus {
        deployment_id: deployment_id.to_string(),
        state: DeploymentState::Unknown,
        instances: Vec::new(),
    }
}

/// Status of a dead job that never scheduled an allocation
pub fn failed_app_status(deployment_id: &str) -> AppStatus {
    AppStatus {
        deployment_id: deployment_id.to_string(),
        state: DeploymentState::Failed,
        instances: vec![InstanceStatus {
            id: deployment_id.to_string(),
            node_id: None,
            state: InstanceState::Failed,
        }],
    }
}

/// Status of a one-shot task, from its first (only) allocation
pub fn task_status_from_allocation(
    task_id: &str,
    allocation: Option<&AllocationListStub>,
) -> TaskStatus {
    let state = match allocation {
        Some(allocation) => launch_state(ClientStatus::parse(&allocation.client_status)),
        None => LaunchState::Unknown,
    };
    TaskStatus {
        task_id: task_id.to_string(),
        state,
    }
}
