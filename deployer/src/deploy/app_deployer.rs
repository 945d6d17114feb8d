//! Lifecycle façade for long-running apps

use std::sync::Arc;

use tracing::{info, warn};

use crate::artifact::{ArtifactResolver, ResolvedArtifact};
use crate::config::DeployerOptions;
use crate::deploy::environment::{self, EnvironmentInfo};
use crate::deploy::job::{self, JobKind};
use crate::deploy::task::TaskCompiler;
use crate::deploy::{groups, identity, status};
use crate::errors::DeployerError;
use crate::models::job::{Allocation, Job};
use crate::models::request::{DeploymentRequest, DriverResource};
use crate::models::status::{AppStatus, DeploymentState};
use crate::nomad::SchedulerClient;

/// Deploys long-running apps as Nomad service jobs
///
/// All operations are synchronous request/response calls against the
/// scheduler client; the scheduler itself owns placement concurrency.
pub struct AppDeployer {
    client: Arc<dyn SchedulerClient>,
    resolver: Arc<dyn ArtifactResolver>,
    options: DeployerOptions,
}

impl AppDeployer {
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

    /// Deploy an app, returning its deployment id
    ///
    /// Rejected with `AlreadyDeployed` when a non-unknown status exists for
    /// the id. The check-then-register sequence is not atomic: two
    /// concurrent deploys for the same id can both observe `unknown` and
    /// both register, relying on the scheduler's own registration semantics
    /// to resolve the race. No extra locking layer is added here.
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<String, DeployerError> {
        let deployment_id = identity::deployment_id(request);

        let current = self.status(&deployment_id).await?;
        if current.state != DeploymentState::Unknown {
            warn!(
                "Rejecting deploy of '{}': current state is {:?}",
                deployment_id, current.state
            );
            return Err(DeployerError::AlreadyDeployed(deployment_id));
        }

        let job = self.compile(request, &deployment_id).await?;
        let eval_id = self.client.register_job(&job).await?;
        info!("Deployed app '{}': evaluation {}", deployment_id, eval_id);

        Ok(deployment_id)
    }

    /// Undeploy an app by deregistering its job
    pub async fn undeploy(&self, deployment_id: &str) -> Result<(), DeployerError> {
        info!("Undeploying job '{}'", deployment_id);

        let current = self.status(deployment_id).await?;
        if current.state == DeploymentState::Unknown {
            return Err(DeployerError::NotDeployed(deployment_id.to_string()));
        }

        self.client.deregister_job(deployment_id).await
    }

    /// Report the current deployment status
    ///
    /// An id unknown to the scheduler is `unknown`, never an error. A dead
    /// job that never scheduled an allocation is `failed`.
    pub async fn status(&self, deployment_id: &str) -> Result<AppStatus, DeployerError> {
        let job = match self.client.job(deployment_id).await? {
            Some(job) => job,
            None => return Ok(status::unknown_app_status(deployment_id)),
        };

        let stubs = self.client.allocations(deployment_id).await?;
        if job.is_dead() && stubs.is_empty() {
            return Ok(status::failed_app_status(deployment_id));
        }

        let mut allocations: Vec<Allocation> = Vec::with_capacity(stubs.len());
        for stub in &stubs {
            allocations.push(self.client.allocation(&stub.id).await?);
        }

        Ok(status::app_status_from_allocations(deployment_id, &allocations))
    }

    /// Describe the platform this deployer talks to
    pub async fn environment_info(&self) -> Result<EnvironmentInfo, DeployerError> {
        environment::environment_info(self.client.as_ref(), &self.options).await
    }

    async fn compile(
        &self,
        request: &DeploymentRequest,
        deployment_id: &str,
    ) -> Result<Job, DeployerError> {
        let artifact = self.resolve_artifact(request).await?;
        let compiler = TaskCompiler::new(&self.options);

        let mut job = job::build_job_spec(&self.options, request, deployment_id, JobKind::Service)?;
        job.task_groups = groups::build_task_groups(&self.options, request, deployment_id, |name| {
            compiler.build_task(request, deployment_id, name, JobKind::Service, artifact.as_ref())
        })?;

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
