//! HTTP client for the Nomad API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::errors::DeployerError;
use crate::models::job::{AgentMember, Allocation, AllocationListStub, Job};

/// The scheduler operations this engine consumes
///
/// Retry policy, if any, belongs behind this boundary; the deployer itself
/// never retries a failed call.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Register (submit) a job, returning the evaluation id
    async fn register_job(&self, job: &Job) -> Result<String, DeployerError>;

    /// Deregister (stop) a job by id
    async fn deregister_job(&self, job_id: &str) -> Result<(), DeployerError>;

    /// Fetch a job by id; `None` when the scheduler does not know it
    async fn job(&self, job_id: &str) -> Result<Option<Job>, DeployerError>;

    /// List the current allocations for a job
    async fn allocations(&self, job_id: &str) -> Result<Vec<AllocationListStub>, DeployerError>;

    /// Fetch full allocation detail
    async fn allocation(&self, alloc_id: &str) -> Result<Allocation, DeployerError>;

    /// List cluster members with their build/region/datacenter tags
    async fn members(&self) -> Result<Vec<AgentMember>, DeployerError>;
}

/// Nomad HTTP API v1 client
pub struct NomadClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct JobRegisterRequest<'a> {
    #[serde(rename = "Job")]
    job: &'a Job,
}

#[derive(Debug, Deserialize)]
struct JobRegisterResponse {
    #[serde(rename = "EvalID")]
    eval_id: String,
}

#[derive(Debug, Deserialize)]
struct AgentMembersResponse {
    #[serde(rename = "Members")]
    members: Vec<AgentMember>,
}

impl NomadClient {
    /// Create a new client against the given Nomad base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeployerError> {
        let url = Url::parse(base_url)
            .map_err(|e| DeployerError::Configuration(format!("Invalid Nomad URL '{}': {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(DeployerError::Transport(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let response = self.client.put(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PUT failed: {} - {}", status, body);
            return Err(DeployerError::Transport(format!("{}: {}", status, body)));
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn delete(&self, path: &str) -> Result<(), DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP DELETE failed: {} - {}", status, body);
            return Err(DeployerError::Transport(format!("{}: {}", status, body)));
        }

        Ok(())
    }
}

#[async_trait]
impl SchedulerClient for NomadClient {
    async fn register_job(&self, job: &Job) -> Result<String, DeployerError> {
        let response: JobRegisterResponse =
            self.put("/v1/jobs", &JobRegisterRequest { job }).await?;
        Ok(response.eval_id)
    }

    async fn deregister_job(&self, job_id: &str) -> Result<(), DeployerError> {
        self.delete(&format!("/v1/job/{}", job_id)).await
    }

    async fn job(&self, job_id: &str) -> Result<Option<Job>, DeployerError> {
        let url = format!("{}/v1/job/{}", self.base_url, job_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        // A missing job is not a transport failure
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(DeployerError::Transport(format!("{}: {}", status, body)));
        }

        let job = response.json().await?;
        Ok(Some(job))
    }

    async fn allocations(&self, job_id: &str) -> Result<Vec<AllocationListStub>, DeployerError> {
        self.get(&format!("/v1/job/{}/allocations", job_id)).await
    }

    async fn allocation(&self, alloc_id: &str) -> Result<Allocation, DeployerError> {
        self.get(&format!("/v1/allocation/{}", alloc_id)).await
    }

    async fn members(&self) -> Result<Vec<AgentMember>, DeployerError> {
        let response: AgentMembersResponse = self.get("/v1/agent/members").await?;
        Ok(response.members)
    }
}
