//! Data models

pub mod job;
pub mod request;
pub mod status;
