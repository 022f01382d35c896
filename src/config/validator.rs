//! Manifest validation.
//!
//! The validator walks the whole parsed manifest and collects every
//! violation before reporting, so a single run surfaces everything that
//! needs fixing in the file.

use crate::error::{ConfigError, Result, ShipyardError, Violation};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::rules::{self, Rule};
use super::spec::{Config, Dependency, Project, Route, Server, Service};

/// Valid TCP/UDP port numbers.
const PORT_RANGE: std::ops::RangeInclusive<i64> = 1..=65535;

/// Validator for deployment manifests.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation outcome: violations plus non-fatal warnings.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Rule violations; any entry fails the manifest.
    pub errors: Vec<Violation>,
    /// Suspicious but accepted constructs.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn require(&mut self, field: &str, value: &str) -> bool {
        if value.is_empty() {
            self.error(field, "is required");
            false
        } else {
            true
        }
    }

    fn require_port(&mut self, field: &str, port: i64) {
        if !PORT_RANGE.contains(&port) {
            self.error(field, "must be between 1 and 65535");
        }
    }

    /// Checks `value` against a `|`-separated rule expression.
    fn check(&mut self, field: &str, value: &str, expression: &str) {
        let Some(alternatives) = rules::parse_expression(expression) else {
            self.error(field, format!("unknown validation rule '{expression}'"));
            return;
        };

        if !rules::satisfies_any(&alternatives, value) {
            let expected = alternatives
                .iter()
                .map(|rule| rule.describe())
                .collect::<Vec<_>>()
                .join(" or ");
            self.error(field, format!("'{value}' is not {expected}"));
        }
    }
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a manifest, failing with every violation found.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any rule is violated.
    pub fn validate(&self, config: &Config) -> Result<ValidationReport> {
        let report = self.report(config);

        for warning in &report.warnings {
            warn!("{warning}");
        }

        if report.is_valid() {
            debug!("Manifest validation passed");
            Ok(report)
        } else {
            debug!("Manifest validation found {} violation(s)", report.error_count());
            Err(ShipyardError::Config(ConfigError::ValidationFailed {
                violations: report.errors,
            }))
        }
    }

    /// Validates a manifest and returns the full report without failing.
    #[must_use]
    pub fn report(&self, config: &Config) -> ValidationReport {
        let mut report = ValidationReport::default();

        Self::validate_project(&config.project, &mut report);
        Self::validate_server(&config.server, &mut report);
        Self::validate_services(&config.services, &mut report);
        Self::validate_dependencies(&config.dependencies, &mut report);

        for (i, volume) in config.volumes.iter().enumerate() {
            report.require(&format!("volumes[{i}]"), volume);
        }

        report
    }

    fn validate_project(project: &Project, report: &mut ValidationReport) {
        report.require("project.name", &project.name);
        if report.require("project.domain", &project.domain) {
            report.check("project.domain", &project.domain, Rule::Fqdn.name());
        }
        if report.require("project.email", &project.email) {
            report.check("project.email", &project.email, Rule::Email.name());
        }
    }

    fn validate_server(server: &Server, report: &mut ValidationReport) {
        if report.require("server.host", &server.host) {
            report.check("server.host", &server.host, "fqdn|ip");
        }
        report.require_port("server.port", server.port);
        report.require("server.user", &server.user);
        if report.require("server.ssh_key", &server.ssh_key) {
            report.check("server.ssh_key", &server.ssh_key, Rule::FilePath.name());
        }
    }

    fn validate_services(services: &[Service], report: &mut ValidationReport) {
        if services.is_empty() {
            report.error("services", "at least one service is required");
            return;
        }

        let mut seen = HashSet::new();
        for (i, service) in services.iter().enumerate() {
            let prefix = format!("services[{i}]");

            if report.require(&format!("{prefix}.name"), &service.name)
                && !seen.insert(service.name.as_str())
            {
                report.warnings.push(format!(
                    "{prefix}.name: service name '{}' is declared more than once",
                    service.name
                ));
            }
            report.require_port(&format!("{prefix}.port"), service.port);

            for (j, route) in service.routes.iter().enumerate() {
                Self::validate_route(route, &format!("{prefix}.routes[{j}]"), report);
            }
            Self::validate_volume_mounts(&service.volumes, &prefix, report);
        }
    }

    fn validate_route(route: &Route, prefix: &str, report: &mut ValidationReport) {
        report.require(&format!("{prefix}.path"), &route.path_prefix);
    }

    fn validate_dependencies(dependencies: &[Dependency], report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, dependency) in dependencies.iter().enumerate() {
            let prefix = format!("dependencies[{i}]");

            if report.require(&format!("{prefix}.name"), &dependency.name)
                && !seen.insert(dependency.name.as_str())
            {
                report.warnings.push(format!(
                    "{prefix}.name: dependency name '{}' is declared more than once",
                    dependency.name
                ));
            }
            report.require(&format!("{prefix}.image"), &dependency.image);

            Self::validate_volume_mounts(&dependency.volumes, &prefix, report);
            for (j, port) in dependency.ports.iter().enumerate() {
                report.require_port(&format!("{prefix}.ports[{j}]"), *port);
            }
        }
    }

    /// Every mount must be `host:container` with an absolute container side.
    fn validate_volume_mounts(volumes: &[String], prefix: &str, report: &mut ValidationReport) {
        for (i, volume) in volumes.iter().enumerate() {
            let field = format!("{prefix}.volumes[{i}]");
            if !Rule::VolumeReference.check(volume) {
                report.check(&field, volume, Rule::VolumeReference.name());
                continue;
            }

            if let Some((_, container)) = volume.split_once(':') {
                report.check(&field, container, Rule::UnixPath.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::spec::Hooks;

    fn valid_config() -> Config {
        Config {
            project: Project {
                name: String::from("shop"),
                domain: String::from("shop.example.com"),
                email: String::from("ops@example.com"),
            },
            server: Server {
                host: String::from("203.0.113.10"),
                port: 22,
                user: String::from("deploy"),
                ssh_key: String::from("~/.ssh/id_ed25519"),
                ..Server::default()
            },
            services: vec![Service {
                name: String::from("web"),
                port: 8080,
                path: String::from("./"),
                routes: vec![Route {
                    path_prefix: String::from("/"),
                    strip_prefix: false,
                }],
                volumes: vec![String::from("uploads:/app/uploads")],
                hooks: Some(Hooks {
                    pre: Some(String::from("echo pre")),
                    post: None,
                }),
                ..Service::default()
            }],
            dependencies: vec![Dependency {
                name: String::from("postgres"),
                image: String::from("postgres:16"),
                volumes: vec![String::from("pg:/var/lib/postgresql/data")],
                ports: vec![5432],
                ..Dependency::default()
            }],
            volumes: vec![String::from("pg"), String::from("uploads")],
        }
    }

    fn fields(err: &ShipyardError) -> Vec<String> {
        err.violations()
            .unwrap_or_default()
            .iter()
            .map(|v| v.field.clone())
            .collect()
    }

    #[test]
    fn test_valid_config_passes() {
        let report = ConfigValidator::new().validate(&valid_config()).unwrap();
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_accumulates_independent_violations() {
        let mut config = valid_config();
        config.project.domain.clear();
        config.services[0].volumes = vec![String::from("a")];
        config.services[0].port = 0;

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        let fields = fields(&err);

        assert_eq!(fields.len(), 3);
        assert!(fields.contains(&String::from("project.domain")));
        assert!(fields.contains(&String::from("services[0].volumes[0]")));
        assert!(fields.contains(&String::from("services[0].port")));
    }

    #[test]
    fn test_port_range_checked_in_validator() {
        let mut config = valid_config();
        config.server.port = 65536;
        config.services[0].port = 70000;
        config.dependencies[0].ports = vec![-1, 65535, 1];

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        let violations = err.violations().unwrap();

        assert_eq!(
            fields(&err),
            vec![
                String::from("server.port"),
                String::from("services[0].port"),
                String::from("dependencies[0].ports[0]"),
            ]
        );
        assert!(violations
            .iter()
            .all(|v| v.message == "must be between 1 and 65535"));
    }

    #[test]
    fn test_whitespace_counts_as_present() {
        let mut config = valid_config();
        config.server.user = String::from(" ");

        assert!(ConfigValidator::new().validate(&config).is_ok());
    }

    #[test]
    fn test_empty_services_rejected() {
        let mut config = valid_config();
        config.services.clear();

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(fields(&err), vec![String::from("services")]);
    }

    #[test]
    fn test_format_rules() {
        let mut config = valid_config();
        config.project.domain = String::from("not a domain");
        config.project.email = String::from("nobody");
        config.server.host = String::from("bad host");
        config.server.ssh_key = String::from("/home/deploy/.ssh/");

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                String::from("project.domain"),
                String::from("project.email"),
                String::from("server.host"),
                String::from("server.ssh_key"),
            ]
        );
    }

    #[test]
    fn test_server_host_accepts_dns_name() {
        let mut config = valid_config();
        config.server.host = String::from("deploy.example.com");
        assert!(ConfigValidator::new().validate(&config).is_ok());
    }

    #[test]
    fn test_nested_elements_are_checked() {
        let mut config = valid_config();
        config.services[0].routes.push(Route::default());
        config.dependencies[0].image.clear();
        config.dependencies[0].ports.push(0);
        config.dependencies[0].volumes.push(String::from("a:b:c"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                String::from("services[0].routes[1].path"),
                String::from("dependencies[0].image"),
                String::from("dependencies[0].volumes[1]"),
                String::from("dependencies[0].ports[1]"),
            ]
        );
    }

    #[test]
    fn test_container_side_must_be_absolute() {
        let mut config = valid_config();
        config.services[0].volumes = vec![String::from("uploads:app/uploads")];

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("absolute path"));
    }

    #[test]
    fn test_duplicate_names_warn_only() {
        let mut config = valid_config();
        let duplicate = config.services[0].clone();
        config.services.push(duplicate);

        let report = ConfigValidator::new().validate(&config).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'web'"));
    }
}
