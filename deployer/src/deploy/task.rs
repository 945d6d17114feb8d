//! Task compilation
//!
//! Builds one runnable unit (command/image, resources, environment, logging,
//! artifacts) per driver family. The driver is a closed set: the Nomad
//! docker driver for container images and the java driver for fetched
//! archives.

use std::collections::BTreeMap;

use crate::artifact::{md5_checksum, ResolvedArtifact};
use crate::config::DeployerOptions;
use crate::deploy::entry_point::{
    self, DYNAMIC_PORT_PLACEHOLDER, SERVER_PORT_KEY,
};
use crate::deploy::job::JobKind;
use crate::deploy::properties::{self, keys};
use crate::errors::DeployerError;
use crate::models::job::{
    LogConfig, NetworkResource, Port, Resources, Service, Task, TaskArtifact,
};
use crate::models::request::{DeploymentRequest, DriverResource};

/// Environment variable exposing the allocation id to container processes
pub const APP_GUID_VAR: &str = "APP_GUID";

/// Placeholder Nomad substitutes with the allocation id
pub const ALLOC_ID_PLACEHOLDER: &str = "${NOMAD_ALLOC_ID}";

/// Label of the single dynamic HTTP port every task requests
pub const HTTP_PORT_LABEL: &str = "http";

/// Compiles a single runnable task for one driver family
pub struct TaskCompiler<'a> {
    options: &'a DeployerOptions,
}

impl<'a> TaskCompiler<'a> {
    pub fn new(options: &'a DeployerOptions) -> Self {
        Self { options }
    }

    /// Build the task for a request, switching on the driver family
    ///
    /// `deployment_id` is the logical app identity; `task_name` is the
    /// per-group identity and differs only for indexed deployments.
    /// Archive tasks require a resolved artifact.
    pub fn build_task(
        &self,
        request: &DeploymentRequest,
        deployment_id: &str,
        task_name: &str,
        kind: JobKind,
        artifact: Option<&ResolvedArtifact>,
    ) -> Result<Task, DeployerError> {
        match &request.resource {
            DriverResource::Container { image } => {
                self.build_container_task(request, deployment_id, task_name, kind, image)
            }
            DriverResource::Archive { .. } => {
                let artifact = artifact.ok_or_else(|| {
                    DeployerError::Artifact(format!(
                        "No resolved artifact for task '{}'",
                        task_name
                    ))
                })?;
                self.build_archive_task(request, task_name, kind, artifact)
            }
        }
    }

    fn build_container_task(
        &self,
        request: &DeploymentRequest,
        deployment_id: &str,
        task_name: &str,
        kind: JobKind,
        image: &str,
    ) -> Result<Task, DeployerError> {
        let mut config = BTreeMap::new();
        config.insert("image".to_string(), serde_json::json!(image));
        config.insert(
            "volumes".to_string(),
            serde_json::json!(self.volumes(request)),
        );

        let mut env = self.request_environment(request)?;
        env.extend(properties::entries_to_map(&self.options.environment_variables));
        if kind == JobKind::Service {
            env.insert(APP_GUID_VAR.to_string(), ALLOC_ID_PLACEHOLDER.to_string());
        }

        entry_point::apply(
            self.options.entry_point_style,
            request,
            &mut env,
            &mut config,
            kind == JobKind::Service,
        )?;

        let mut services = Vec::new();
        if kind == JobKind::Service
            && properties::resolve_flag(request, keys::EXPOSE_ROUTE, self.options.expose_route)
        {
            services.push(Service {
                name: deployment_id.to_string(),
                port_label: HTTP_PORT_LABEL.to_string(),
                tags: self.route_tags(request, deployment_id, task_name),
            });
        }

        Ok(Task {
            name: task_name.to_string(),
            driver: "docker".to_string(),
            config,
            env,
            resources: self.build_resources(request)?,
            services,
            artifacts: Vec::new(),
            log_config: self.log_config(),
        })
    }

    fn build_archive_task(
        &self,
        request: &DeploymentRequest,
        task_name: &str,
        kind: JobKind,
        artifact: &ResolvedArtifact,
    ) -> Result<Task, DeployerError> {
        let mut config = BTreeMap::new();
        config.insert(
            "jarPath".to_string(),
            serde_json::json!(format!(
                "{}/{}",
                self.options.artifact_destination, artifact.filename
            )),
        );
        config.insert(
            "jvmOptions".to_string(),
            serde_json::json!(self.jvm_options(request)),
        );

        let mut env = self.request_environment(request)?;
        env.extend(properties::entries_to_map(&self.options.environment_variables));

        // If a server-port entry slipped in through the env-vars path,
        // rewrite it to the dynamic port so the port-binding contract holds.
        for (key, value) in env.iter_mut() {
            if key.replace('_', ".").eq_ignore_ascii_case(SERVER_PORT_KEY) {
                *value = DYNAMIC_PORT_PLACEHOLDER.to_string();
            }
        }

        // The java driver has no three-way entry-point switch; serialized
        // configuration is the only injection path.
        env.insert(
            entry_point::APP_CONFIG_JSON_VAR.to_string(),
            entry_point::config_json(request, kind == JobKind::Service)?,
        );

        let mut getter_options = BTreeMap::new();
        getter_options.insert(
            "checksum".to_string(),
            format!("md5:{}", md5_checksum(&artifact.content)),
        );

        Ok(Task {
            name: task_name.to_string(),
            driver: "java".to_string(),
            config,
            env,
            resources: self.build_resources(request)?,
            services: Vec::new(),
            artifacts: vec![TaskArtifact {
                getter_source: artifact.uri.clone(),
                getter_options,
                relative_dest: self.options.artifact_destination.clone(),
            }],
            log_config: self.log_config(),
        })
    }

    fn build_resources(&self, request: &DeploymentRequest) -> Result<Resources, DeployerError> {
        Ok(Resources {
            cpu: properties::resolve_u32(
                request,
                keys::CPU,
                keys::NOMAD_CPU,
                self.options.resources.cpu,
            )?,
            memory_mb: properties::resolve_memory(request, self.options.resources.memory)?,
            networks: vec![NetworkResource {
                mbits: self.options.resources.network_mbits,
                dynamic_ports: vec![Port {
                    label: HTTP_PORT_LABEL.to_string(),
                    value: self.external_port(request)?,
                }],
            }],
        })
    }

    /// Port requested when the app declares an explicit server port, 8080 otherwise
    fn external_port(&self, request: &DeploymentRequest) -> Result<u32, DeployerError> {
        match request.definition.properties.get(SERVER_PORT_KEY) {
            Some(raw) => properties::parse_u32(SERVER_PORT_KEY, raw),
            None => Ok(8080),
        }
    }

    /// Environment variables declared on the request itself
    fn request_environment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<BTreeMap<String, String>, DeployerError> {
        match request.deployment_property(keys::ENVIRONMENT_VARIABLES) {
            Some(raw) => properties::parse_key_value_list(keys::ENVIRONMENT_VARIABLES, raw),
            None => Ok(BTreeMap::new()),
        }
    }

    fn volumes(&self, request: &DeploymentRequest) -> Vec<String> {
        match request.deployment_property(keys::VOLUMES) {
            Some(raw) => raw
                .split(',')
                .map(|volume| volume.trim().to_string())
                .filter(|volume| !volume.is_empty())
                .collect(),
            None => self.options.volumes.clone(),
        }
    }

    fn jvm_options(&self, request: &DeploymentRequest) -> Vec<String> {
        let raw = request
            .deployment_property(keys::JAVA_OPTS)
            .or(self.options.java_opts.as_deref())
            .unwrap_or("");
        raw.split(',')
            .map(|opt| opt.trim().to_string())
            .filter(|opt| !opt.is_empty())
            .collect()
    }

    /// Identity labels plus the routing prefix consumed by the external router
    fn route_tags(
        &self,
        request: &DeploymentRequest,
        deployment_id: &str,
        task_name: &str,
    ) -> Vec<String> {
        let mut tags = vec![format!("app={}", deployment_id)];
        if let Some(group) = request.deployment_property(keys::GROUP) {
            tags.push(format!("group={}", group));
        }
        tags.push(format!("deployment={}", task_name));

        let hostname = request
            .deployment_property(keys::ROUTE_HOSTNAME)
            .unwrap_or(deployment_id);
        tags.push(format!("urlprefix-{}/", hostname));
        tags
    }

    fn log_config(&self) -> LogConfig {
        LogConfig {
            max_files: self.options.logging.max_files,
            max_file_size_mb: self.options.logging.max_file_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::AppDefinition;

    fn container_request() -> DeploymentRequest {
        DeploymentRequest::new(
            AppDefinition::new("test-app"),
            DriverResource::Container {
                image: "registry.example.com/app:1.2".to_string(),
            },
        )
    }

    fn archive_request() -> DeploymentRequest {
        DeploymentRequest::new(
            AppDefinition::new("test-app"),
            DriverResource::Archive {
                coordinate: "com.example:app:1.2".to_string(),
            },
        )
    }

    fn artifact() -> ResolvedArtifact {
        ResolvedArtifact {
            uri: "https://repo.example.com/app-1.2.jar".to_string(),
            filename: "app-1.2.jar".to_string(),
            content: b"jar-bytes".to_vec(),
        }
    }

    #[test]
    fn test_container_task_basics() {
        let options = DeployerOptions::default();
        let task = TaskCompiler::new(&options)
            .build_task(&container_request(), "test-app", "test-app", JobKind::Service, None)
            .unwrap();

        assert_eq!(task.driver, "docker");
        assert_eq!(
            task.config.get("image").unwrap(),
            "registry.example.com/app:1.2"
        );
        assert_eq!(task.env.get(APP_GUID_VAR).unwrap(), ALLOC_ID_PLACEHOLDER);
        assert_eq!(task.resources.cpu, 1000);
        assert_eq!(task.resources.memory_mb, 512);
        assert_eq!(task.resources.networks[0].dynamic_ports[0].label, "http");
        assert!(task.artifacts.is_empty());
    }

    #[test]
    fn test_generic_memory_key_normalized() {
        let options = DeployerOptions::default();
        let mut request = container_request();
        request
            .deployment_properties
            .insert(keys::MEMORY.to_string(), "512Mi".to_string());

        let task = TaskCompiler::new(&options)
            .build_task(&request, "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert_eq!(task.resources.memory_mb, 512);
    }

    #[test]
    fn test_batch_task_has_no_guid_and_no_port_injection() {
        let options = DeployerOptions::default();
        let task = TaskCompiler::new(&options)
            .build_task(&container_request(), "test-app", "test-app", JobKind::Batch, None)
            .unwrap();

        assert!(!task.env.contains_key(APP_GUID_VAR));
        let args: Vec<String> =
            serde_json::from_value(task.config.get("args").unwrap().clone()).unwrap();
        assert!(!args.iter().any(|a| a.starts_with("--server.port=")));
    }

    #[test]
    fn test_request_volumes_override_defaults() {
        let mut options = DeployerOptions::default();
        options.volumes = vec!["/host:/container".to_string()];
        let mut request = container_request();

        let compiler = TaskCompiler::new(&options);
        let task = compiler
            .build_task(&request, "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert_eq!(
            task.config.get("volumes").unwrap(),
            &serde_json::json!(["/host:/container"])
        );

        request
            .deployment_properties
            .insert(keys::VOLUMES.to_string(), "/data:/data,/tmp:/scratch".to_string());
        let task = compiler
            .build_task(&request, "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert_eq!(
            task.config.get("volumes").unwrap(),
            &serde_json::json!(["/data:/data", "/tmp:/scratch"])
        );
    }

    #[test]
    fn test_route_service_attached_when_exposed() {
        let options = DeployerOptions::default();
        let mut request = container_request();
        request
            .deployment_properties
            .insert(keys::EXPOSE_ROUTE.to_string(), "true".to_string());
        request
            .deployment_properties
            .insert(keys::GROUP.to_string(), "g1".to_string());

        let task = TaskCompiler::new(&options)
            .build_task(&request, "g1-test-app", "g1-test-app-0", JobKind::Service, None)
            .unwrap();

        assert_eq!(task.services.len(), 1);
        let service = &task.services[0];
        assert_eq!(service.name, "g1-test-app");
        assert_eq!(service.port_label, "http");
        assert!(service.tags.contains(&"app=g1-test-app".to_string()));
        assert!(service.tags.contains(&"group=g1".to_string()));
        assert!(service.tags.contains(&"deployment=g1-test-app-0".to_string()));
        assert!(service.tags.contains(&"urlprefix-g1-test-app/".to_string()));
    }

    #[test]
    fn test_route_hostname_property_overrides_prefix() {
        let options = DeployerOptions::default();
        let mut request = container_request();
        request
            .deployment_properties
            .insert(keys::EXPOSE_ROUTE.to_string(), "true".to_string());
        request
            .deployment_properties
            .insert(keys::ROUTE_HOSTNAME.to_string(), "app.example.com".to_string());

        let task = TaskCompiler::new(&options)
            .build_task(&request, "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert!(task.services[0]
            .tags
            .contains(&"urlprefix-app.example.com/".to_string()));
    }

    #[test]
    fn test_archive_task_config_and_checksum() {
        let options = DeployerOptions::default();
        let mut request = archive_request();
        request
            .deployment_properties
            .insert(keys::JAVA_OPTS.to_string(), "-Xmx256m,-Xms64m".to_string());

        let artifact = artifact();
        let task = TaskCompiler::new(&options)
            .build_task(&request, "test-app", "test-app", JobKind::Service, Some(&artifact))
            .unwrap();

        assert_eq!(task.driver, "java");
        assert_eq!(task.config.get("jarPath").unwrap(), "local/app-1.2.jar");
        assert_eq!(
            task.config.get("jvmOptions").unwrap(),
            &serde_json::json!(["-Xmx256m", "-Xms64m"])
        );

        assert_eq!(task.artifacts.len(), 1);
        let stanza = &task.artifacts[0];
        assert_eq!(stanza.getter_source, "https://repo.example.com/app-1.2.jar");
        assert_eq!(stanza.relative_dest, "local");
        assert_eq!(
            stanza.getter_options.get("checksum").unwrap(),
            &format!("md5:{}", md5_checksum(b"jar-bytes"))
        );

        // Archive tasks always carry the serialized configuration
        assert!(task.env.contains_key(entry_point::APP_CONFIG_JSON_VAR));
    }

    #[test]
    fn test_archive_task_requires_artifact() {
        let options = DeployerOptions::default();
        let err = TaskCompiler::new(&options)
            .build_task(&archive_request(), "test-app", "test-app", JobKind::Service, None)
            .unwrap_err();
        assert!(matches!(err, DeployerError::Artifact(_)));
    }

    #[test]
    fn test_archive_server_port_env_rewritten() {
        let options = DeployerOptions::default();
        let mut request = archive_request();
        request.deployment_properties.insert(
            keys::ENVIRONMENT_VARIABLES.to_string(),
            "SERVER_PORT=8888,OTHER=1".to_string(),
        );

        let artifact = artifact();
        let task = TaskCompiler::new(&options)
            .build_task(&request, "test-app", "test-app", JobKind::Service, Some(&artifact))
            .unwrap();

        assert_eq!(task.env.get("SERVER_PORT").unwrap(), DYNAMIC_PORT_PLACEHOLDER);
        assert_eq!(task.env.get("OTHER").unwrap(), "1");
    }

    #[test]
    fn test_explicit_server_port_used_for_port_request() {
        let options = DeployerOptions::default();
        let mut request = container_request();
        request
            .definition
            .properties
            .insert(SERVER_PORT_KEY.to_string(), "9191".to_string());

        let task = TaskCompiler::new(&options)
            .build_task(&request, "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert_eq!(task.resources.networks[0].dynamic_ports[0].value, 9191);
    }

    #[test]
    fn test_deployer_env_vars_merged() {
        let mut options = DeployerOptions::default();
        options.environment_variables = vec!["REGION=eu-west".to_string()];

        let task = TaskCompiler::new(&options)
            .build_task(&container_request(), "test-app", "test-app", JobKind::Service, None)
            .unwrap();
        assert_eq!(task.env.get("REGION").unwrap(), "eu-west");
    }
}
