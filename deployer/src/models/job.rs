//! Nomad job specification models
//!
//! Field names follow the Nomad HTTP API v1 wire format (PascalCase).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level scheduling unit submitted to Nomad
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Region")]
    pub region: String,

    /// Job kind: "service" for long-running apps, "batch" for one-shot tasks
    #[serde(rename = "Type")]
    pub job_type: String,

    #[serde(rename = "Datacenters")]
    pub datacenters: Vec<String>,

    #[serde(rename = "Priority")]
    pub priority: u32,

    #[serde(rename = "Constraints")]
    pub constraints: Vec<Constraint>,

    #[serde(rename = "Meta")]
    pub meta: BTreeMap<String, String>,

    #[serde(rename = "TaskGroups")]
    pub task_groups: Vec<TaskGroup>,

    /// Cluster-reported job status, only present on jobs read back from Nomad
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Job {
    /// Whether the scheduler considers this job fully terminal
    pub fn is_dead(&self) -> bool {
        self.status.as_deref() == Some("dead")
    }
}

/// Placement constraint triple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "LTarget")]
    pub attribute: String,

    #[serde(rename = "Operand")]
    pub operator: String,

    #[serde(rename = "RTarget")]
    pub value: String,
}

/// A named, independently placed and scaled subset of a Job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGroup {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Count")]
    pub count: u32,

    #[serde(rename = "RestartPolicy")]
    pub restart_policy: RestartPolicy,

    #[serde(rename = "EphemeralDisk")]
    pub ephemeral_disk: EphemeralDisk,

    #[serde(rename = "Tasks")]
    pub tasks: Vec<Task>,
}

/// Restart policy for a task group
///
/// Delay and interval are nanoseconds on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartPolicy {
    #[serde(rename = "Delay")]
    pub delay: u64,

    #[serde(rename = "Interval")]
    pub interval: u64,

    #[serde(rename = "Attempts")]
    pub attempts: u32,

    #[serde(rename = "Mode")]
    pub mode: String,
}

impl RestartPolicy {
    pub fn new(delay: Duration, interval: Duration, attempts: u32, mode: &str) -> Self {
        Self {
            delay: delay.as_nanos() as u64,
            interval: interval.as_nanos() as u64,
            attempts,
            mode: mode.to_string(),
        }
    }
}

/// Local ephemeral-disk policy for a task group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralDisk {
    #[serde(rename = "Sticky")]
    pub sticky: bool,

    #[serde(rename = "Migrate")]
    pub migrate: bool,

    #[serde(rename = "SizeMB")]
    pub size_mb: u32,
}

/// One runnable process spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Name")]
    pub name: String,

    /// Driver identifier: "docker" or "java"
    #[serde(rename = "Driver")]
    pub driver: String,

    /// Driver-specific configuration map
    #[serde(rename = "Config")]
    pub config: BTreeMap<String, serde_json::Value>,

    #[serde(rename = "Env")]
    pub env: BTreeMap<String, String>,

    #[serde(rename = "Resources")]
    pub resources: Resources,

    #[serde(rename = "Services", skip_serializing_if = "Vec::is_empty", default)]
    pub services: Vec<Service>,

    #[serde(rename = "Artifacts", skip_serializing_if = "Vec::is_empty", default)]
    pub artifacts: Vec<TaskArtifact>,

    #[serde(rename = "LogConfig")]
    pub log_config: LogConfig,
}

/// Resource request for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    /// CPU shares in MHz
    #[serde(rename = "CPU")]
    pub cpu: u32,

    #[serde(rename = "MemoryMB")]
    pub memory_mb: u32,

    #[serde(rename = "Networks")]
    pub networks: Vec<NetworkResource>,
}

/// Network bandwidth and port requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkResource {
    #[serde(rename = "MBits")]
    pub mbits: u32,

    #[serde(rename = "DynamicPorts")]
    pub dynamic_ports: Vec<Port>,
}

/// A single port request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "Label")]
    pub label: String,

    #[serde(rename = "Value")]
    pub value: u32,
}

/// Service registration attached to a task (Consul)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "PortLabel")]
    pub port_label: String,

    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
}

/// Artifact fetch directive, verified by the Nomad client before execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskArtifact {
    #[serde(rename = "GetterSource")]
    pub getter_source: String,

    #[serde(rename = "GetterOptions")]
    pub getter_options: BTreeMap<String, String>,

    #[serde(rename = "RelativeDest")]
    pub relative_dest: String,
}

/// Log retention policy for a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "MaxFiles")]
    pub max_files: u32,

    #[serde(rename = "MaxFileSizeMB")]
    pub max_file_size_mb: u32,
}

/// Allocation summary returned when listing a job's allocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationListStub {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "TaskGroup")]
    pub task_group: String,

    #[serde(rename = "ClientStatus")]
    pub client_status: String,
}

/// Full allocation detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "NodeID", default)]
    pub node_id: String,

    #[serde(rename = "TaskGroup")]
    pub task_group: String,

    #[serde(rename = "ClientStatus")]
    pub client_status: String,
}

/// Cluster member reported by the agent API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMember {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Tags")]
    pub tags: BTreeMap<String, String>,
}
