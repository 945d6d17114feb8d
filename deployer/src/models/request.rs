//! Deployment request models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An application definition: a name plus free-form application properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDefinition {
    /// Application name
    pub name: String,

    /// Application-level properties, injected per the entry-point style
    pub properties: BTreeMap<String, String>,
}

impl AppDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: BTreeMap::new(),
        }
    }
}

/// The runnable resource a request points at
///
/// A closed set of driver families: a container image reference for the
/// Nomad docker driver, or an archive coordinate resolved to a fetchable
/// JVM artifact for the java driver. Drivers are never mixed within one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DriverResource {
    /// Container image reference, e.g. "registry.example.com/app:1.2.0"
    Container { image: String },

    /// Archive coordinate handed to the artifact resolver,
    /// e.g. "com.example:billing-app:2.1.0"
    Archive { coordinate: String },
}

/// A deployment (or task launch) request
///
/// Immutable once received. `deployment_properties` carry the recognized
/// `deployer.*` keys; anything unrecognized is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRequest {
    /// Application definition
    pub definition: AppDefinition,

    /// The resource to run
    pub resource: DriverResource,

    /// Free-form command-line arguments appended after rendered properties
    pub command_line_args: Vec<String>,

    /// Deployment properties (string keys and values)
    pub deployment_properties: BTreeMap<String, String>,
}

impl DeploymentRequest {
    pub fn new(definition: AppDefinition, resource: DriverResource) -> Self {
        Self {
            definition,
            resource,
            command_line_args: Vec::new(),
            deployment_properties: BTreeMap::new(),
        }
    }

    /// Look up a deployment property
    pub fn deployment_property(&self, key: &str) -> Option<&str> {
        self.deployment_properties.get(key).map(|value| value.as_str())
    }
}
