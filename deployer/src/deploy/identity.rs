//! Deployment and task identity

use chrono::Utc;

use crate::deploy::properties::keys;
use crate::models::request::DeploymentRequest;

/// Derive the stable deployment id for a request
///
/// `{group}-{appName}` when a group property is present, `{appName}` alone
/// otherwise. Dots are replaced with dashes to satisfy the Nomad job
/// identifier charset.
pub fn deployment_id(request: &DeploymentRequest) -> String {
    let name = &request.definition.name;
    let id = match request.deployment_property(keys::GROUP) {
        Some(group) => format!("{}-{}", group, name),
        None => name.clone(),
    };
    id.replace('.', "-")
}

/// Derive a single-use task id for a launch request
///
/// Appends a wall-clock millisecond timestamp so repeated launches of the
/// same definition never collide. Task ids trade the idempotent-redeploy
/// semantics of app ids for collision avoidance.
pub fn task_id(request: &DeploymentRequest) -> String {
    format!("{}-{}", deployment_id(request), Utc::now().timestamp_millis())
}
