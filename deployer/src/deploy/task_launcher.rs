//! Lifecycle façade for one-shot tasks

use std::sync::Arc;

use tracing::info;

use crate::artifact::{ArtifactResolver, ResolvedArtifact};
use crate::config::DeployerOptions;
use crate::deploy::environment::{self, EnvironmentInfo};
use crate::deploy::job::{self, JobKind};
use crate::deploy::task::TaskCompiler;
use crate::deploy::{groups, identity, status};
use crate::errors::DeployerError;
use crate::models::job::Job;
use crate::models::request::{DeploymentRequest, DriverResource};
use crate::models::status::TaskStatus;
use crate::nomad::SchedulerClient;

/// Launches one-shot tasks as Nomad batch jobs
///
/// Task ids carry a timestamp suffix and are single-use, so launch has no
/// already-deployed precondition. A failed task fails visibly: batch groups
/// never retry, regardless of the deployer's restart defaults.
pub struct TaskLauncher {
    client: Arc<dyn SchedulerClient>,
    resolver: Arc<dyn ArtifactResolver>,
    options: DeployerOptions,
}

impl TaskLauncher {
    pub fn new(
        client: Arc<dyn SchedulerClient>,
        resolver: Arc<dyn ArtifactResolver>,
        options: DeployerOptions,
    ) -> Self {
        Self {
            client,
            resolver,
            options,
        }
    }

    /// Launch a task, returning its single-use task id
    pub async fn launch(&self, request: &DeploymentRequest) -> Result<String, DeployerError> {
        let task_id = identity::task_id(request);

        let job = self.compile(request, &task_id).await?;
        let eval_id = self.client.register_job(&job).await?;
        info!("Launched task '{}': evaluation {}", task_id, eval_id);

        Ok(task_id)
    }

    /// Cancel a task by deregistering its job
    pub async fn cancel(&self, task_id: &str) -> Result<(), DeployerError> {
        info!("Cancelling task '{}'", task_id);

        match self.client.job(task_id).await? {
            Some(job) => self.client.deregister_job(&job.id).await,
            None => Err(DeployerError::NotDeployed(task_id.to_string())),
        }
    }

    /// Report the current launch status, from the first allocation only
    pub async fn status(&self, task_id: &str) -> Result<TaskStatus, DeployerError> {
        if self.client.job(task_id).await?.is_none() {
            return Ok(status::task_status_from_allocation(task_id, None));
        }

        let allocations = self.client.allocations(task_id).await?;
        Ok(status::task_status_from_allocation(task_id, allocations.first()))
    }

    /// Clean up a finished task
    ///
    /// Deregistration is the only teardown primitive the scheduler exposes,
    /// so this is an alias for `cancel`.
    pub async fn cleanup(&self, task_id: &str) -> Result<(), DeployerError> {
        self.cancel(task_id).await
    }

    /// Destroy a task; alias for `cancel`, see `cleanup`
    pub async fn destroy(&self, task_id: &str) -> Result<(), DeployerError> {
        self.cancel(task_id).await
    }

    /// Describe the platform this launcher talks to
    pub async fn environment_info(&self) -> Result<EnvironmentInfo, DeployerError> {
        environment::environment_info(self.client.as_ref(), &self.options).await
    }

    async fn compile(&self, request: &DeploymentRequest, task_id: &str) -> Result<Job, DeployerError> {
        let artifact = self.resolve_artifact(request).await?;
        let compiler = TaskCompiler::new(&self.options);

        let mut job = job::build_job_spec(&self.options, request, task_id, JobKind::Batch)?;

        // Multiple instances of tasks are not supported: one group, count 1,
        // regardless of the count property.
        let mut group = groups::build_task_group(&self.options, request, task_id, 1)?;
        group.restart_policy.mode = "fail".to_string();
        group.restart_policy.attempts = 1;
        group.tasks = vec![compiler.build_task(
            request,
            task_id,
            task_id,
            JobKind::Batch,
            artifact.as_ref(),
        )?];
        job.task_groups = vec![group];

        Ok(job)
    }

    async fn resolve_artifact(
        &self,
        request: &DeploymentRequest,
    ) -> Result<Option<ResolvedArtifact>, DeployerError> {
        match &request.resource {
            DriverResource::Archive { coordinate } => {
                Ok(Some(self.resolver.resolve(coordinate).await?))
            }
            DriverResource::Container { .. } => Ok(None),
        }
    }
}
