//! Error types for the Nomad deployer

use thiserror::Error;

/// Main error type for the Nomad deployer
///
/// Only `Transport` represents a genuine fault. `AlreadyDeployed` and
/// `NotDeployed` are precondition violations the caller is expected to
/// handle, and `Configuration` is always fatal to the single operation
/// that raised it. A missing job on a status query is never an error;
/// it is reported as the `unknown` state instead.
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("App '{0}' is already deployed")]
    AlreadyDeployed(String),

    #[error("App '{0}' is not deployed")]
    NotDeployed(String),

    #[error("Scheduler transport error: {0}")]
    Transport(String),

    #[error("Artifact error: {0}")]
    Artifact(String),
}

impl From<reqwest::Error> for DeployerError {
    fn from(err: reqwest::Error) -> Self {
        DeployerError::Transport(err.to_string())
    }
}

impl From<anyhow::Error> for DeployerError {
    fn from(err: anyhow::Error) -> Self {
        DeployerError::Artifact(err.to_string())
    }
}
