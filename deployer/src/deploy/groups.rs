//! Task group construction and partitioning
//!
//! A non-indexed request produces a single group scaled to the requested
//! count; all instances share one group and may co-locate. An indexed
//! request decomposes into one single-instance group per partition, because
//! a scheduler that colocates same-group replicas on one node defeats
//! partition tolerance.

use tracing::debug;

use crate::config::DeployerOptions;
use crate::deploy::properties::{self, keys};
use crate::errors::DeployerError;
use crate::models::job::{EphemeralDisk, RestartPolicy, Task, TaskGroup};
use crate::models::request::DeploymentRequest;

/// Environment variable carrying the partition index, injected put-if-absent
pub const INSTANCE_INDEX_VAR: &str = "INSTANCE_INDEX";

/// Environment variable carrying the group identity, injected put-if-absent
pub const APP_GROUP_VAR: &str = "APP_GROUP";

/// Build the task groups for a request
///
/// `build_task` compiles the task for a given group name; indexed requests
/// call it once per partition so each task carries its group's identity.
pub fn build_task_groups<F>(
    options: &DeployerOptions,
    request: &DeploymentRequest,
    deployment_id: &str,
    build_task: F,
) -> Result<Vec<TaskGroup>, DeployerError>
where
    F: Fn(&str) -> Result<Task, DeployerError>,
{
    let count = properties::app_count(request)?;

    if !properties::is_indexed(request) {
        let mut group = build_task_group(options, request, deployment_id, count)?;
        group.tasks = vec![build_task(deployment_id)?];
        return Ok(vec![group]);
    }

    debug!("Building {} indexed task groups for '{}'", count, deployment_id);
    let mut groups = Vec::with_capacity(count as usize);
    for index in 0..count {
        let indexed_id = format!("{}-{}", deployment_id, index);
        let mut group = build_task_group(options, request, &indexed_id, 1)?;
        let mut task = build_task(&indexed_id)?;

        // Put-if-absent: explicit user-provided values always win
        task.env
            .entry(INSTANCE_INDEX_VAR.to_string())
            .or_insert_with(|| index.to_string());
        if let Some(group_id) = request.deployment_property(keys::GROUP) {
            task.env
                .entry(APP_GROUP_VAR.to_string())
                .or_insert_with(|| group_id.to_string());
        }

        group.tasks = vec![task];
        groups.push(group);
    }

    Ok(groups)
}

/// Build one task group shell
///
/// The group name uses the deployment id rather than the group deployment
/// property: apps sharing a logical group must still be schedulable on
/// different clients.
pub fn build_task_group(
    options: &DeployerOptions,
    request: &DeploymentRequest,
    name: &str,
    count: u32,
) -> Result<TaskGroup, DeployerError> {
    let restart = &options.restart_policy;
    let disk = &options.ephemeral_disk;

    let size = match request.deployment_property(keys::EPHEMERAL_DISK_SIZE) {
        Some(raw) => properties::parse_u32(keys::EPHEMERAL_DISK_SIZE, raw)?,
        None => disk.size,
    };

    Ok(TaskGroup {
        name: name.to_string(),
        count,
        restart_policy: RestartPolicy::new(
            restart.delay,
            restart.interval,
            restart.attempts,
            &restart.mode,
        ),
        ephemeral_disk: EphemeralDisk {
            sticky: properties::resolve_flag(request, keys::EPHEMERAL_DISK_STICKY, disk.sticky),
            migrate: properties::resolve_flag(request, keys::EPHEMERAL_DISK_MIGRATE, disk.migrate),
            size_mb: size,
        },
        tasks: Vec::new(),
    })
}
