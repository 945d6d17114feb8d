//! Shared test fixtures: an in-memory scheduler and artifact resolver

// Not every test target uses every fixture.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use nomad_deployer::artifact::{ArtifactResolver, ResolvedArtifact};
use nomad_deployer::errors::DeployerError;
use nomad_deployer::models::job::{AgentMember, Allocation, AllocationListStub, Job};
use nomad_deployer::models::request::{AppDefinition, DeploymentRequest, DriverResource};
use nomad_deployer::nomad::SchedulerClient;

/// In-memory scheduler holding registered jobs and scripted allocations
#[derive(Default)]
pub struct FakeNomad {
    jobs: Mutex<BTreeMap<String, Job>>,
    allocations: Mutex<BTreeMap<String, Vec<Allocation>>>,
    members: Vec<AgentMember>,
    eval_counter: AtomicU64,
}

impl FakeNomad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members(members: Vec<AgentMember>) -> Self {
        Self {
            members,
            ..Self::default()
        }
    }

    /// Script the allocations reported for a job
    pub fn set_allocations(&self, job_id: &str, statuses: &[(&str, &str)]) {
        let allocations = statuses
            .iter()
            .map(|(id, client_status)| Allocation {
                id: id.to_string(),
                node_id: "node-1".to_string(),
                task_group: job_id.to_string(),
                client_status: client_status.to_string(),
            })
            .collect();
        self.allocations
            .lock()
            .unwrap()
            .insert(job_id.to_string(), allocations);
    }

    /// Overwrite the cluster-reported status of a registered job
    pub fn set_job_status(&self, job_id: &str, status: &str) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(job_id) {
            job.status = Some(status.to_string());
        }
    }

    pub fn registered_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(job_id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl SchedulerClient for FakeNomad {
    async fn register_job(&self, job: &Job) -> Result<String, DeployerError> {
        self.jobs
            .lock()
            .unwrap()
            .insert(job.id.clone(), job.clone());
        let eval = self.eval_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("eval-{}", eval))
    }

    async fn deregister_job(&self, job_id: &str) -> Result<(), DeployerError> {
        self.jobs.lock().unwrap().remove(job_id);
        self.allocations.lock().unwrap().remove(job_id);
        Ok(())
    }

    async fn job(&self, job_id: &str) -> Result<Option<Job>, DeployerError> {
        Ok(self.jobs.lock().unwrap().get(job_id).cloned())
    }

    async fn allocations(&self, job_id: &str) -> Result<Vec<AllocationListStub>, DeployerError> {
        Ok(self
            .allocations
            .lock()
            .unwrap()
            .get(job_id)
            .map(|allocations| {
                allocations
                    .iter()
                    .map(|allocation| AllocationListStub {
                        id: allocation.id.clone(),
                        task_group: allocation.task_group.clone(),
                        client_status: allocation.client_status.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn allocation(&self, alloc_id: &str) -> Result<Allocation, DeployerError> {
        self.allocations
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|allocation| allocation.id == alloc_id)
            .cloned()
            .ok_or_else(|| DeployerError::Transport(format!("No allocation '{}'", alloc_id)))
    }

    async fn members(&self) -> Result<Vec<AgentMember>, DeployerError> {
        Ok(self.members.clone())
    }
}

/// Artifact resolver returning fixed content for any coordinate
pub struct FakeResolver;

#[async_trait]
impl ArtifactResolver for FakeResolver {
    async fn resolve(&self, coordinate: &str) -> Result<ResolvedArtifact, DeployerError> {
        let filename = format!("{}.jar", coordinate.replace(':', "-"));
        Ok(ResolvedArtifact {
            uri: format!("https://repo.example.com/{}", filename),
            filename,
            content: b"jar-bytes".to_vec(),
        })
    }
}

/// A container-image request with the given deployment properties
pub fn container_request(name: &str, props: &[(&str, &str)]) -> DeploymentRequest {
    let mut request = DeploymentRequest::new(
        AppDefinition::new(name),
        DriverResource::Container {
            image: "registry.example.com/app:1.0".to_string(),
        },
    );
    for (key, value) in props {
        request
            .deployment_properties
            .insert(key.to_string(), value.to_string());
    }
    request
}

/// An archive request with the given deployment properties
pub fn archive_request(name: &str, props: &[(&str, &str)]) -> DeploymentRequest {
    let mut request = DeploymentRequest::new(
        AppDefinition::new(name),
        DriverResource::Archive {
            coordinate: "com.example:app:1.0".to_string(),
        },
    );
    for (key, value) in props {
        request
            .deployment_properties
            .insert(key.to_string(), value.to_string());
    }
    request
}
