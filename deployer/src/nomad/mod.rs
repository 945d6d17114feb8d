//! Nomad scheduler client

pub mod client;

pub use client::{NomadClient, SchedulerClient};
