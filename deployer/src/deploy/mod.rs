//! Deployment engine
//!
//! Translates deployment requests into Nomad job specifications and
//! reconciles scheduler state back into deployment status.

pub mod app_deployer;
pub mod entry_point;
pub mod environment;
pub mod groups;
pub mod identity;
pub mod job;
pub mod properties;
pub mod status;
pub mod task;
pub mod task_launcher;

pub use app_deployer::AppDeployer;
pub use task_launcher::TaskLauncher;
