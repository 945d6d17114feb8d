//! Deployer configuration options

use std::time::Duration;

use crate::deploy::entry_point::EntryPointStyle;

/// Main deployer options
///
/// An immutable configuration struct passed into every operation. There is
/// no ambient/global state; anything a compiler or façade needs comes from
/// here or from the request itself.
#[derive(Debug, Clone)]
pub struct DeployerOptions {
    /// Nomad HTTP API base URL
    pub nomad_url: String,

    /// Timeout applied to every scheduler call
    pub request_timeout: Duration,

    /// Nomad region jobs are submitted to
    pub region: String,

    /// Datacenters jobs are eligible for
    pub datacenters: Vec<String>,

    /// Default job priority, used when no priority property is present
    pub priority: u32,

    /// Restart policy applied to long-running task groups
    pub restart_policy: RestartPolicyOptions,

    /// Ephemeral disk defaults
    pub ephemeral_disk: EphemeralDiskOptions,

    /// Resource defaults
    pub resources: ResourceOptions,

    /// Log retention applied to every task (not overridable per request)
    pub logging: LoggingOptions,

    /// How configuration is injected into container processes
    pub entry_point_style: EntryPointStyle,

    /// Environment variables (`KEY=VAL`) merged into every task
    pub environment_variables: Vec<String>,

    /// Default volume mounts (`host:container`) for container tasks
    pub volumes: Vec<String>,

    /// Relative destination directory for fetched archive artifacts
    pub artifact_destination: String,

    /// Default JVM options for archive tasks, comma separated
    pub java_opts: Option<String>,

    /// Minimum Java runtime version constraint, e.g. "1.8"
    pub minimum_java_version: Option<String>,

    /// Register a routable service entry for container apps by default
    pub expose_route: bool,

    /// Version reported by `environment_info`
    pub platform_client_version: String,
}

impl Default for DeployerOptions {
    fn default() -> Self {
        Self {
            nomad_url: "http://localhost:4646".to_string(),
            request_timeout: Duration::from_secs(30),
            region: "global".to_string(),
            datacenters: vec!["dc1".to_string()],
            priority: 50,
            restart_policy: RestartPolicyOptions::default(),
            ephemeral_disk: EphemeralDiskOptions::default(),
            resources: ResourceOptions::default(),
            logging: LoggingOptions::default(),
            entry_point_style: EntryPointStyle::Exec,
            environment_variables: Vec::new(),
            volumes: Vec::new(),
            artifact_destination: "local".to_string(),
            java_opts: None,
            minimum_java_version: None,
            expose_route: false,
            platform_client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Restart policy defaults for long-running task groups
#[derive(Debug, Clone)]
pub struct RestartPolicyOptions {
    /// Delay before restarting a failed task
    pub delay: Duration,

    /// Window in which `attempts` restarts are allowed
    pub interval: Duration,

    /// Restart attempts within `interval`
    pub attempts: u32,

    /// Behaviour when attempts are exhausted: "delay" or "fail"
    pub mode: String,
}

impl Default for RestartPolicyOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            interval: Duration::from_secs(120),
            attempts: 3,
            mode: "delay".to_string(),
        }
    }
}

/// Ephemeral disk defaults
#[derive(Debug, Clone)]
pub struct EphemeralDiskOptions {
    /// Keep task data on the same node across restarts
    pub sticky: bool,

    /// Migrate task data when rescheduled to a different node
    pub migrate: bool,

    /// Disk size in MiB
    pub size: u32,
}

impl Default for EphemeralDiskOptions {
    fn default() -> Self {
        Self {
            sticky: false,
            migrate: false,
            size: 300,
        }
    }
}

/// Task resource defaults
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    /// CPU shares in MHz
    pub cpu: u32,

    /// Memory in MiB
    pub memory: u32,

    /// Network bandwidth in MBit/s
    pub network_mbits: u32,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            cpu: 1000,
            memory: 512,
            network_mbits: 10,
        }
    }
}

/// Log retention applied to every compiled task
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Maximum number of rotated log files
    pub max_files: u32,

    /// Maximum size of each log file in MiB
    pub max_file_size: u32,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            max_files: 1,
            max_file_size: 10,
        }
    }
}
