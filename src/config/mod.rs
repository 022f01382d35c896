//! Configuration module for the Shipyard deployment tool.
//!
//! This module turns manifest text into a validated, environment-resolved
//! [`Config`]:
//! - Expanding `${NAME}` / `${NAME:-DEFAULT}` placeholders
//! - Parsing and normalizing `shipyard.yaml`
//! - Validation against a fixed rule table
//! - Computing per-service fingerprints for change detection

mod expand;
mod fingerprint;
mod parser;
mod rules;
mod spec;
mod validator;

pub use expand::{expand, EnvSource, ProcessEnv};
pub use fingerprint::{canonical_form, CanonicalForm, Fingerprinter};
pub use parser::{
    find_config_file, load_service_env_files, normalize, ConfigParser, DEFAULT_CONFIG_FILES,
    DEFAULT_SERVICE_PATH, ENV_FILE,
};
pub use rules::{parse_expression, satisfies_any, Rule};
pub use spec::{
    Config, Container, ContainerHealthCheck, Dependency, HealthCheck, Hooks, Project, Route,
    Server, Service, Ulimit,
};
pub use validator::{ConfigValidator, ValidationReport};
