//! Job compilation
//!
//! Assembles the top-level job object: identity, placement constraints,
//! priority, metadata and job kind. Task groups are attached by the caller.

use std::collections::BTreeMap;

use crate::config::DeployerOptions;
use crate::deploy::properties::{self, keys};
use crate::errors::DeployerError;
use crate::models::job::{Constraint, Job};
use crate::models::request::DeploymentRequest;

/// Job kind submitted to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Long-running app
    Service,

    /// One-shot task
    Batch,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Service => "service",
            JobKind::Batch => "batch",
        }
    }
}

/// Build the job shell for a request
pub fn build_job_spec(
    options: &DeployerOptions,
    request: &DeploymentRequest,
    deployment_id: &str,
    kind: JobKind,
) -> Result<Job, DeployerError> {
    let priority = match request.deployment_property(keys::JOB_PRIORITY) {
        Some(raw) => properties::parse_u32(keys::JOB_PRIORITY, raw)?,
        None => options.priority,
    };

    let mut constraints = Vec::new();
    if let Some(version) = &options.minimum_java_version {
        constraints.push(Constraint {
            attribute: "${driver.java.version}".to_string(),
            operator: ">=".to_string(),
            value: version.clone(),
        });
    }

    Ok(Job {
        id: deployment_id.to_string(),
        name: deployment_id.to_string(),
        region: options.region.clone(),
        job_type: kind.as_str().to_string(),
        datacenters: options.datacenters.clone(),
        priority,
        constraints,
        meta: build_meta(request)?,
        task_groups: Vec::new(),
        status: None,
    })
}

/// Parse job metadata from the comma-separated meta property
fn build_meta(request: &DeploymentRequest) -> Result<BTreeMap<String, String>, DeployerError> {
    match request.deployment_property(keys::META) {
        Some(raw) => properties::parse_key_value_list(keys::META, raw),
        None => Ok(BTreeMap::new()),
    }
}
