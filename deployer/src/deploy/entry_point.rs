//! Entry-point strategy
//!
//! Decides how application properties and extra command-line arguments are
//! injected into the process. The three styles are mutually exclusive and
//! selected by deployer configuration, not per request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DeployerError;
use crate::models::request::DeploymentRequest;

/// Application property holding an explicit server port
pub const SERVER_PORT_KEY: &str = "server.port";

/// Placeholder Nomad substitutes with the dynamically allocated port
pub const DYNAMIC_PORT_PLACEHOLDER: &str = "${NOMAD_PORT_http}";

/// Environment variable carrying the serialized application properties
pub const APP_CONFIG_JSON_VAR: &str = "APP_CONFIG_JSON";

/// How configuration reaches the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPointStyle {
    /// Properties and extra arguments rendered as `--key=value` process args
    Exec,

    /// All properties serialized as one JSON object in `APP_CONFIG_JSON`
    Boot,

    /// Each property key upper-cased and `.`→`_` into an env variable
    Shell,
}

impl std::str::FromStr for EntryPointStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exec" => Ok(EntryPointStyle::Exec),
            "boot" => Ok(EntryPointStyle::Boot),
            "shell" => Ok(EntryPointStyle::Shell),
            _ => Err(format!("Invalid entry point style: {}", s)),
        }
    }
}

/// Render application properties and extra arguments as `--key=value` tokens
///
/// When `inject_dynamic_port` is set and no explicit server-port property or
/// argument is present, a `--server.port=${NOMAD_PORT_http}` argument is
/// appended so the process binds to the port Nomad actually allocated.
pub fn command_line_arguments(request: &DeploymentRequest, inject_dynamic_port: bool) -> Vec<String> {
    let mut arguments: Vec<String> = request
        .definition
        .properties
        .iter()
        .map(|(key, value)| format!("--{}={}", key, value))
        .collect();
    arguments.extend(request.command_line_args.iter().cloned());

    let port_prefix = format!("--{}=", SERVER_PORT_KEY);
    let has_port = request.definition.properties.contains_key(SERVER_PORT_KEY)
        || arguments.iter().any(|arg| arg.starts_with(&port_prefix));
    if inject_dynamic_port && !has_port {
        arguments.push(format!("--{}={}", SERVER_PORT_KEY, DYNAMIC_PORT_PLACEHOLDER));
    }

    debug!("Using command args: {:?}", arguments);
    arguments
}

/// Serialize the application's effective configuration as a JSON object
///
/// The object is derived from the rendered command-line tokens, so it
/// includes extra arguments and the injected dynamic server port.
pub fn config_json(request: &DeploymentRequest, inject_dynamic_port: bool) -> Result<String, DeployerError> {
    let map: BTreeMap<String, String> = command_line_arguments(request, inject_dynamic_port)
        .iter()
        .filter_map(|argument| {
            argument
                .strip_prefix("--")
                .and_then(|argument| argument.split_once('='))
        })
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    serde_json::to_string(&map)
        .map_err(|e| DeployerError::Configuration(format!("Unable to serialize {}: {}", APP_CONFIG_JSON_VAR, e)))
}

/// Apply an entry-point style to a task's environment and driver config
pub fn apply(
    style: EntryPointStyle,
    request: &DeploymentRequest,
    env: &mut BTreeMap<String, String>,
    config: &mut BTreeMap<String, serde_json::Value>,
    inject_dynamic_port: bool,
) -> Result<(), DeployerError> {
    match style {
        EntryPointStyle::Exec => {
            config.insert(
                "args".to_string(),
                serde_json::json!(command_line_arguments(request, inject_dynamic_port)),
            );
        }
        EntryPointStyle::Boot => {
            // The two injection paths are exclusive; precedence would be
            // ambiguous otherwise.
            if env.contains_key(APP_CONFIG_JSON_VAR) {
                return Err(DeployerError::Configuration(format!(
                    "Cannot use boot entry point style and also set {} for the app",
                    APP_CONFIG_JSON_VAR
                )));
            }
            let json = serde_json::to_string(&request.definition.properties).map_err(|e| {
                DeployerError::Configuration(format!(
                    "Unable to serialize {}: {}",
                    APP_CONFIG_JSON_VAR, e
                ))
            })?;
            env.insert(APP_CONFIG_JSON_VAR.to_string(), json);
        }
        EntryPointStyle::Shell => {
            for (key, value) in &request.definition.properties {
                let name = key.replace('.', "_").to_uppercase();
                env.insert(name, value.clone());
            }
        }
    }
    Ok(())
}
