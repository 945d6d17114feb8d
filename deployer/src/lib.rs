//! Nomad Deployer Library
//!
//! Translates abstract deployment and task-launch requests into Nomad job
//! specifications, submits them over the Nomad HTTP API, and reconciles
//! allocation state back into a small deployment-state model.

pub mod artifact;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod logging;
pub mod models;
pub mod nomad;
