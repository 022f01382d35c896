//! Manifest specification types.
//!
//! These structs map one-to-one onto `shipyard.yaml`. Every field carries a
//! serde default so that an absent required key surfaces as a validation
//! violation instead of aborting the parse; unknown keys are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Root of a deployment manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Project identity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub project: Project,
    /// Deployment target.
    #[serde(default, deserialize_with = "null_as_default")]
    pub server: Server,
    /// Deployable services, in authoring order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<Service>,
    /// Auxiliary containers (databases, caches).
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<Dependency>,
    /// Shared named volumes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<String>,
}

/// Project identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Project name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Public domain the project is served under.
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
    /// Contact address (used for certificate registration).
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

/// Deployment target host.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Server {
    /// Hostname or IP address.
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    /// SSH port; range-checked by the validator.
    #[serde(default, deserialize_with = "null_as_default")]
    pub port: i64,
    /// Administrative user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    /// Path to the SSH private key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssh_key: String,
    /// Password, supplied at runtime only.
    #[serde(skip)]
    pub passwd: Option<String>,
    /// Root SSH key, supplied at runtime only.
    #[serde(skip)]
    pub root_ssh_key: Option<String>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("ssh_key", &self.ssh_key)
            .field("passwd", &self.passwd.as_ref().map(|_| "<redacted>"))
            .field("root_ssh_key", &self.root_ssh_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A deployable, routed service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    /// Service name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Image reference; built from `path` when set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: Option<String>,
    /// Set by the deployment driver when the image was rebuilt this run.
    #[serde(skip)]
    pub image_updated: bool,
    /// Port the container listens on; range-checked by the validator.
    #[serde(default, deserialize_with = "null_as_default")]
    pub port: i64,
    /// Source directory (build context); normalized to `./` when empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// HTTP health check.
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_check: Option<HealthCheck>,
    /// Path-prefix routes, first match wins.
    #[serde(default, deserialize_with = "null_as_default")]
    pub routes: Vec<Route>,
    /// `host:container` volume mounts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<String>,
    /// Start command override.
    #[serde(default, deserialize_with = "null_as_default")]
    pub command: Option<String>,
    /// Entrypoint override.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entrypoint: Vec<String>,
    /// `KEY=VALUE` environment assignments.
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    /// Port forward specs.
    #[serde(default, deserialize_with = "null_as_default")]
    pub forwards: Vec<String>,
    /// Always recreate the container on deploy.
    #[serde(default, deserialize_with = "null_as_default")]
    pub recreate: bool,
    /// Shell snippets run around deployment.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hooks: Option<Hooks>,
    /// Low-level container tuning.
    #[serde(default, deserialize_with = "null_as_default")]
    pub container: Option<Container>,
    /// Local ports allocated by the deployment driver.
    #[serde(skip)]
    pub local_ports: Vec<u16>,
}

/// HTTP health check declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheck {
    /// Path probed over HTTP.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    /// Time between probes.
    #[serde(default, with = "duration_str")]
    pub interval: Duration,
    /// Probe timeout.
    #[serde(default, with = "duration_str")]
    pub timeout: Duration,
    /// Failed probes tolerated before the service is unhealthy.
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,
}

/// Container-level tuning shared by services and dependencies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    /// Container engine health check.
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_check: Option<ContainerHealthCheck>,
    /// Resource limits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ulimits: Vec<Ulimit>,
}

/// A resource limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ulimit {
    /// Limit name, e.g. `nofile`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Hard limit.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hard: i64,
    /// Soft limit.
    #[serde(default, deserialize_with = "null_as_default")]
    pub soft: i64,
}

/// Health check executed by the container engine.
///
/// Timings are passed through verbatim to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerHealthCheck {
    /// Command to run inside the container.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cmd: String,
    /// Interval between checks.
    #[serde(default, deserialize_with = "null_as_default")]
    pub interval: String,
    /// Consecutive failures before unhealthy.
    #[serde(default, deserialize_with = "null_as_default")]
    pub retries: u32,
    /// Per-check timeout.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeout: String,
    /// Grace period after start.
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_period: String,
    /// Maximum time to wait for the first healthy result.
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_timeout: String,
}

/// A path-prefix routing rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    /// Path prefix to match.
    #[serde(default, rename = "path", deserialize_with = "null_as_default")]
    pub path_prefix: String,
    /// Strip the prefix before forwarding.
    #[serde(default, deserialize_with = "null_as_default")]
    pub strip_prefix: bool,
}

/// An auxiliary container that is not routed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    /// Dependency name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Image reference.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// `host:container` volume mounts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub volumes: Vec<String>,
    /// `KEY=VALUE` environment assignments.
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    /// Exposed ports.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<i64>,
    /// Low-level container tuning.
    #[serde(default, deserialize_with = "null_as_default")]
    pub container: Option<Container>,
}

/// Pre/post deployment hooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hooks {
    /// Run before the service is deployed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre: Option<String>,
    /// Run after the service is deployed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub post: Option<String>,
}

impl Config {
    /// Looks up a service by name.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Treats an explicit YAML `null` (e.g. an unset placeholder) as the field default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Serde adapter for `humantime` duration strings (`"10s"`, `"1m30s"`).
///
/// A bare integer is read as nanoseconds.
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Nanos(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Option::<RawDuration>::deserialize(deserializer)? {
            None => Ok(Duration::ZERO),
            Some(RawDuration::Nanos(nanos)) => Ok(Duration::from_nanos(nanos)),
            Some(RawDuration::Text(raw)) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(Duration::ZERO);
                }
                humantime::parse_duration(raw).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_durations() {
        let yaml = "path: /healthz\ninterval: 10s\ntimeout: 1m 30s\nretries: 3\n";
        let check: HealthCheck = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(check.path, "/healthz");
        assert_eq!(check.interval, Duration::from_secs(10));
        assert_eq!(check.timeout, Duration::from_secs(90));
        assert_eq!(check.retries, 3);
    }

    #[test]
    fn test_integer_duration_is_nanoseconds() {
        let yaml = "path: /healthz\ninterval: 30\ntimeout: 2000000000\n";
        let check: HealthCheck = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(check.interval, Duration::from_nanos(30));
        assert_eq!(check.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_out_of_range_port_parses() {
        let service: Service = serde_yaml::from_str("name: web\nport: 70000\n").unwrap();
        assert_eq!(service.port, 70000);

        let dependency: Dependency =
            serde_yaml::from_str("name: pg\nimage: postgres\nports: [-1, 5432]\n").unwrap();
        assert_eq!(dependency.ports, vec![-1, 5432]);
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let yaml = "name: web\nport:\npath:\nvolumes:\n";
        let service: Service = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(service.name, "web");
        assert_eq!(service.port, 0);
        assert!(service.path.is_empty());
        assert!(service.volumes.is_empty());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let yaml = "name: web\nport: 80\nreplicas: 3\n";
        let service: Service = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(service.port, 80);
    }

    #[test]
    fn test_runtime_fields_not_serialized() {
        let service = Service {
            name: String::from("web"),
            image_updated: true,
            local_ports: vec![40000],
            ..Service::default()
        };

        let yaml = serde_yaml::to_string(&service).unwrap();
        assert!(!yaml.contains("image_updated"));
        assert!(!yaml.contains("local_ports"));
    }

    #[test]
    fn test_server_debug_redacts_credentials() {
        let server = Server {
            passwd: Some(String::from("hunter2")),
            ..Server::default()
        };

        let rendered = format!("{server:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
