//! Deployment property resolution
//!
//! Values are resolved from an ordered precedence chain: a generic
//! cross-scheduler property on the request, then a Nomad-specific property
//! on the request, then the statically configured deployer default.

use std::collections::BTreeMap;

use crate::errors::DeployerError;
use crate::models::request::DeploymentRequest;

/// Recognized deployment-property keys
pub mod keys {
    // Generic, cross-scheduler keys
    pub const GROUP: &str = "deployer.group";
    pub const COUNT: &str = "deployer.count";
    pub const INDEXED: &str = "deployer.indexed";
    pub const CPU: &str = "deployer.cpu";
    pub const MEMORY: &str = "deployer.memory";

    // Nomad-specific keys
    pub const NOMAD_CPU: &str = "deployer.nomad.cpu";
    pub const NOMAD_MEMORY: &str = "deployer.nomad.memory";
    pub const JOB_PRIORITY: &str = "deployer.nomad.job-priority";
    pub const META: &str = "deployer.nomad.meta";
    pub const ENVIRONMENT_VARIABLES: &str = "deployer.nomad.environment-variables";
    pub const JAVA_OPTS: &str = "deployer.nomad.java-opts";
    pub const VOLUMES: &str = "deployer.nomad.volumes";
    pub const EPHEMERAL_DISK_STICKY: &str = "deployer.nomad.ephemeral-disk.sticky";
    pub const EPHEMERAL_DISK_MIGRATE: &str = "deployer.nomad.ephemeral-disk.migrate";
    pub const EPHEMERAL_DISK_SIZE: &str = "deployer.nomad.ephemeral-disk.size";
    pub const EXPOSE_ROUTE: &str = "deployer.nomad.expose-route";
    pub const ROUTE_HOSTNAME: &str = "deployer.nomad.route-hostname";
}

/// Resolve a numeric value through the precedence chain
///
/// A malformed value fails with a `Configuration` error naming the
/// offending key and raw value.
pub fn resolve_u32(
    request: &DeploymentRequest,
    generic_key: &str,
    specific_key: &str,
    default: u32,
) -> Result<u32, DeployerError> {
    if let Some(raw) = request.deployment_property(generic_key) {
        return parse_u32(generic_key, raw);
    }
    if let Some(raw) = request.deployment_property(specific_key) {
        return parse_u32(specific_key, raw);
    }
    Ok(default)
}

/// Resolve the memory request in MiB
///
/// The generic memory key supports byte-size suffixes (`512Mi`, `1g`) and is
/// normalized to MiB before falling through to the Nomad-specific key and
/// the deployer default.
pub fn resolve_memory(request: &DeploymentRequest, default: u32) -> Result<u32, DeployerError> {
    if let Some(raw) = request.deployment_property(keys::MEMORY) {
        return parse_mebibytes(keys::MEMORY, raw);
    }
    if let Some(raw) = request.deployment_property(keys::NOMAD_MEMORY) {
        return parse_u32(keys::NOMAD_MEMORY, raw);
    }
    Ok(default)
}

/// Parse a base-10 unsigned integer property
pub fn parse_u32(key: &str, raw: &str) -> Result<u32, DeployerError> {
    raw.trim().parse::<u32>().map_err(|_| {
        DeployerError::Configuration(format!("Invalid value '{}' for property '{}'", raw, key))
    })
}

/// Parse a byte-size value into MiB
///
/// Accepts a plain number (already MiB) or a number with a `k`/`ki`,
/// `m`/`mi` or `g`/`gi` suffix, case-insensitive.
pub fn parse_mebibytes(key: &str, raw: &str) -> Result<u32, DeployerError> {
    let lower = raw.trim().to_lowercase();
    let invalid = || {
        DeployerError::Configuration(format!("Invalid value '{}' for property '{}'", raw, key))
    };

    let (digits, to_mib): (&str, fn(u64) -> u64) = if let Some(n) = lower
        .strip_suffix("gi")
        .or_else(|| lower.strip_suffix('g'))
    {
        (n, |v| v * 1024)
    } else if let Some(n) = lower.strip_suffix("mi").or_else(|| lower.strip_suffix('m')) {
        (n, |v| v)
    } else if let Some(n) = lower.strip_suffix("ki").or_else(|| lower.strip_suffix('k')) {
        (n, |v| v / 1024)
    } else {
        (lower.as_str(), |v| v)
    };

    let value = digits.trim().parse::<u64>().map_err(|_| invalid())?;
    u32::try_from(to_mib(value)).map_err(|_| invalid())
}

/// Resolve a boolean flag: the per-request property wins when present,
/// otherwise the deployer default applies
///
/// Flags are opt-in: any value other than "true" (case-insensitive) is false.
pub fn resolve_flag(request: &DeploymentRequest, key: &str, default: bool) -> bool {
    match request.deployment_property(key) {
        Some(raw) => raw.eq_ignore_ascii_case("true"),
        None => default,
    }
}

/// Parse a comma-separated `KEY=VAL,KEY=VAL` property into a map
///
/// An entry with no `=` fails with a `Configuration` error naming the key
/// and the offending entry.
pub fn parse_key_value_list(
    key: &str,
    raw: &str,
) -> Result<BTreeMap<String, String>, DeployerError> {
    let mut map = BTreeMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, value) = entry.split_once('=').ok_or_else(|| {
            DeployerError::Configuration(format!(
                "Invalid entry '{}' for property '{}'",
                entry, key
            ))
        })?;
        map.insert(name.to_string(), value.to_string());
    }
    Ok(map)
}

/// Parse `KEY=VAL` entries (deployer-default environment variables) into a map
pub fn entries_to_map(entries: &[String]) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter_map(|entry| entry.split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Desired instance count for a request, default 1
///
/// A group's instance count is always at least 1; zero is rejected rather
/// than submitting a job that can never schedule anything.
pub fn app_count(request: &DeploymentRequest) -> Result<u32, DeployerError> {
    let count = match request.deployment_property(keys::COUNT) {
        Some(raw) => parse_u32(keys::COUNT, raw)?,
        None => 1,
    };
    if count == 0 {
        return Err(DeployerError::Configuration(format!(
            "Invalid value '0' for property '{}': at least one instance is required",
            keys::COUNT
        )));
    }
    Ok(count)
}

/// Whether the request asks for a partitioned (indexed) deployment
pub fn is_indexed(request: &DeploymentRequest) -> bool {
    resolve_flag(request, keys::INDEXED, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{AppDefinition, DriverResource};

    fn request_with(props: &[(&str, &str)]) -> DeploymentRequest {
        let mut request = DeploymentRequest::new(
            AppDefinition::new("test-app"),
            DriverResource::Container {
                image: "example/app:1.0".to_string(),
            },
        );
        for (key, value) in props {
            request
                .deployment_properties
                .insert(key.to_string(), value.to_string());
        }
        request
    }

    #[test]
    fn test_resolve_generic_key_wins() {
        let request = request_with(&[(keys::CPU, "750"), (keys::NOMAD_CPU, "250")]);
        assert_eq!(
            resolve_u32(&request, keys::CPU, keys::NOMAD_CPU, 1000).unwrap(),
            750
        );
    }

    #[test]
    fn test_resolve_specific_key_falls_through() {
        let request = request_with(&[(keys::NOMAD_CPU, "250")]);
        assert_eq!(
            resolve_u32(&request, keys::CPU, keys::NOMAD_CPU, 1000).unwrap(),
            250
        );
    }

    #[test]
    fn test_resolve_default_when_absent() {
        let request = request_with(&[]);
        assert_eq!(
            resolve_u32(&request, keys::CPU, keys::NOMAD_CPU, 1000).unwrap(),
            1000
        );
    }

    #[test]
    fn test_malformed_numeric_names_key_and_value() {
        let request = request_with(&[(keys::CPU, "lots")]);
        let err = resolve_u32(&request, keys::CPU, keys::NOMAD_CPU, 1000).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(keys::CPU));
        assert!(message.contains("lots"));
    }

    #[test]
    fn test_memory_suffix_normalized_to_mib() {
        let request = request_with(&[(keys::MEMORY, "512Mi")]);
        assert_eq!(resolve_memory(&request, 128).unwrap(), 512);

        let request = request_with(&[(keys::MEMORY, "2g")]);
        assert_eq!(resolve_memory(&request, 128).unwrap(), 2048);

        let request = request_with(&[(keys::MEMORY, "1024")]);
        assert_eq!(resolve_memory(&request, 128).unwrap(), 1024);
    }

    #[test]
    fn test_memory_falls_through_to_nomad_key() {
        let request = request_with(&[(keys::NOMAD_MEMORY, "256")]);
        assert_eq!(resolve_memory(&request, 128).unwrap(), 256);
    }

    #[test]
    fn test_key_value_list_parsing() {
        let map = parse_key_value_list(keys::META, "a=1,b=2").unwrap();
        assert_eq!(map.get("a").unwrap(), "1");
        assert_eq!(map.get("b").unwrap(), "2");
    }

    #[test]
    fn test_key_value_list_malformed_entry() {
        let err = parse_key_value_list(keys::META, "a=1,oops").unwrap_err();
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn test_value_with_equals_preserved() {
        let map = parse_key_value_list(keys::ENVIRONMENT_VARIABLES, "OPTS=a=b").unwrap();
        assert_eq!(map.get("OPTS").unwrap(), "a=b");
    }

    #[test]
    fn test_app_count_default() {
        assert_eq!(app_count(&request_with(&[])).unwrap(), 1);
        assert_eq!(app_count(&request_with(&[(keys::COUNT, "3")])).unwrap(), 3);
    }

    #[test]
    fn test_app_count_zero_rejected() {
        let err = app_count(&request_with(&[(keys::COUNT, "0")])).unwrap_err();
        assert!(matches!(err, DeployerError::Configuration(_)));
        assert!(err.to_string().contains(keys::COUNT));
    }

    #[test]
    fn test_resolve_flag_request_overrides_default() {
        assert!(resolve_flag(&request_with(&[]), keys::EXPOSE_ROUTE, true));
        assert!(!resolve_flag(
            &request_with(&[(keys::EXPOSE_ROUTE, "false")]),
            keys::EXPOSE_ROUTE,
            true
        ));
        assert!(resolve_flag(
            &request_with(&[(keys::EXPOSE_ROUTE, "TRUE")]),
            keys::EXPOSE_ROUTE,
            false
        ));
    }
}
