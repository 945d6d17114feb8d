//! Runtime environment information

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::DeployerOptions;
use crate::errors::DeployerError;
use crate::nomad::SchedulerClient;

/// Description of the platform the deployer is talking to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Platform name
    pub platform_type: String,

    /// Platform API version
    pub platform_api_version: String,

    /// Deployer client version
    pub platform_client_version: String,

    /// Comma-joined distinct build versions across cluster members
    pub platform_host_version: String,

    /// Per-member build/region/datacenter tags
    pub platform_specific_info: BTreeMap<String, String>,
}

/// Build the environment info from the cluster's member list
pub async fn environment_info(
    client: &dyn SchedulerClient,
    options: &DeployerOptions,
) -> Result<EnvironmentInfo, DeployerError> {
    let members = client.members().await?;

    let host_versions: BTreeSet<String> = members
        .iter()
        .filter_map(|member| member.tags.get("build").cloned())
        .collect();

    let mut info = BTreeMap::new();
    for member in &members {
        for (tag, suffix) in [("build", "build"), ("region", "region"), ("dc", "datacenter")] {
            if let Some(value) = member.tags.get(tag) {
                info.insert(format!("{}-{}", member.name, suffix), value.clone());
            }
        }
    }

    Ok(EnvironmentInfo {
        platform_type: "Hashicorp Nomad".to_string(),
        platform_api_version: "v1".to_string(),
        platform_client_version: options.platform_client_version.clone(),
        platform_host_version: host_versions.into_iter().collect::<Vec<_>>().join(","),
        platform_specific_info: info,
    })
}
