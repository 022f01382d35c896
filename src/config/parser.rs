//! Manifest loading.
//!
//! Loading runs in fixed phases, each usable on its own:
//!
//! 1. load `.env` from the base directory (never overriding set variables)
//! 2. expand `${NAME}` / `${NAME:-DEFAULT}` placeholders
//! 3. deserialize the YAML into [`Config`]
//! 4. [`normalize`] defaults
//! 5. load each service's own `.env`
//! 6. validate

use crate::error::{ConfigError, Result, ShipyardError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::expand::{self, EnvSource, ProcessEnv};
use super::spec::Config;
use super::validator::ConfigValidator;

/// Name of the per-directory environment file.
pub const ENV_FILE: &str = ".env";

/// Path a service gets when it declares none.
pub const DEFAULT_SERVICE_PATH: &str = "./";

/// Manifest parser.
#[derive(Debug)]
pub struct ConfigParser {
    /// Directory holding the pre-expansion `.env`; the working directory when unset.
    base_path: Option<PathBuf>,
    /// Whether `.env` files are loaded at all.
    load_env_files: bool,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser {
    /// Creates a new parser that loads `.env` files from the working directory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_path: None,
            load_env_files: true,
        }
    }

    /// Sets the directory the pre-expansion `.env` is read from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Enables or disables `.env` loading.
    #[must_use]
    pub const fn with_env_files(mut self, enabled: bool) -> Self {
        self.load_env_files = enabled;
        self
    }

    /// Runs the full pipeline against the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an env file cannot be loaded, the YAML is
    /// malformed, or validation fails.
    pub fn load(&self, data: &[u8]) -> Result<Config> {
        self.load_with(data, &ProcessEnv)
    }

    /// Runs the full pipeline, expanding placeholders against `env`.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigParser::load`].
    pub fn load_with(&self, data: &[u8], env: &impl EnvSource) -> Result<Config> {
        let config = self.parse(data, env)?;
        ConfigValidator::new().validate(&config)?;
        Ok(config)
    }

    /// Reads and loads a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, or if loading fails.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Config> {
        let config = self.parse_file(path)?;
        ConfigValidator::new().validate(&config)?;
        Ok(config)
    }

    /// Reads a manifest file and runs every phase except validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, an env file
    /// cannot be loaded, or the YAML is malformed.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        info!("Loading manifest from: {}", path.display());

        if !path.exists() {
            return Err(ShipyardError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let data = std::fs::read(path).map_err(|e| {
            ShipyardError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse(&data, &ProcessEnv).map_err(|e| match e {
            ShipyardError::Config(ConfigError::ParseError { message, location: None }) => {
                ShipyardError::Config(ConfigError::ParseError {
                    message,
                    location: Some(path.display().to_string()),
                })
            }
            other => other,
        })
    }

    /// Runs every phase except validation.
    ///
    /// # Errors
    ///
    /// Returns an error if an env file cannot be loaded or the YAML is malformed.
    pub fn parse(&self, data: &[u8], env: &impl EnvSource) -> Result<Config> {
        if self.load_env_files {
            self.load_dotenv()?;
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| ConfigError::parse(format!("Manifest is not valid UTF-8: {e}")))?;
        let expanded = expand::expand(text, env);

        let mut config = Self::parse_yaml(&expanded)?;
        normalize(&mut config);

        if self.load_env_files {
            load_service_env_files(&config)?;
        }

        Ok(config)
    }

    /// Deserializes already-expanded YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(content: &str) -> Result<Config> {
        debug!("Parsing YAML manifest");

        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::parse(format!("YAML parse error: {e}")))?;

        debug!(
            "Parsed manifest for project '{}' with {} service(s)",
            config.project.name,
            config.services.len()
        );
        Ok(config)
    }

    /// Loads the `.env` file from the base directory if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(ENV_FILE), |p| p.join(ENV_FILE));

        load_env_file(&env_path).map(|_| ())
    }
}

/// Applies post-parse defaults.
///
/// An empty service path becomes `./`; an empty image reference is dropped.
pub fn normalize(config: &mut Config) {
    for service in &mut config.services {
        if service.path.is_empty() {
            service.path = String::from(DEFAULT_SERVICE_PATH);
        }
        if service.image.as_deref().is_some_and(|image| image.trim().is_empty()) {
            service.image = None;
        }
    }
}

/// Loads `<service.path>/.env` for every service that has one.
///
/// Runs after expansion, so these files only affect later readers of the
/// environment (image builds, hooks).
///
/// # Errors
///
/// Returns an error if an existing file cannot be loaded.
pub fn load_service_env_files(config: &Config) -> Result<()> {
    for service in &config.services {
        let env_path = Path::new(&service.path).join(ENV_FILE);
        if load_env_file(&env_path)? {
            debug!("Loaded environment for service '{}'", service.name);
        }
    }
    Ok(())
}

/// Loads `path` into the process environment, returning whether it existed.
fn load_env_file(path: &Path) -> Result<bool> {
    if !path.is_file() {
        debug!("No env file at: {}", path.display());
        return Ok(false);
    }

    info!("Loading environment from: {}", path.display());
    dotenvy::from_path(path).map_err(|e| {
        ShipyardError::Config(ConfigError::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })?;
    Ok(true)
}

/// Default manifest file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "shipyard.yaml",
    "shipyard.yml",
    "deploy.yaml",
    "deploy.yml",
];

/// Finds the manifest in `start_dir` or its ancestors.
///
/// # Errors
///
/// Returns an error if no manifest is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found manifest: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ShipyardError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
project:
  name: shop
  domain: ${DOMAIN:-shop.example.com}
  email: ops@example.com
server:
  host: ${SERVER_HOST}
  port: 22
  user: deploy
  ssh_key: ~/.ssh/id_ed25519
services:
  - name: web
    image: registry.example.com/shop/web:${TAG:-latest}
    port: 8080
    health_check:
      path: /healthz
      interval: 10s
      timeout: 5s
      retries: 3
    routes:
      - path: /
      - path: /api
        strip_prefix: true
    volumes:
      - uploads:/app/uploads
    env:
      - DATABASE_URL=postgres://shop@postgres:5432/shop
    hooks:
      pre: ./migrate.sh
  - name: worker
    path: ./worker
    port: 9000
dependencies:
  - name: postgres
    image: postgres:16
    volumes:
      - pg:/var/lib/postgresql/data
    ports:
      - 5432
volumes:
  - pg
  - uploads
"#;

    fn parser() -> ConfigParser {
        ConfigParser::new().with_env_files(false)
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_full_manifest() {
        let vars = env(&[("SERVER_HOST", "203.0.113.10"), ("TAG", "v2")]);
        let config = parser().load_with(MANIFEST.as_bytes(), &vars).unwrap();

        assert_eq!(config.project.domain, "shop.example.com");
        assert_eq!(config.server.host, "203.0.113.10");
        assert_eq!(config.services.len(), 2);

        let web = &config.services[0];
        assert_eq!(web.image.as_deref(), Some("registry.example.com/shop/web:v2"));
        assert_eq!(web.routes.len(), 2);
        assert!(web.routes[1].strip_prefix);
        assert_eq!(web.health_check.as_ref().map(|h| h.retries), Some(3));
        assert_eq!(web.hooks.as_ref().and_then(|h| h.pre.as_deref()), Some("./migrate.sh"));

        assert_eq!(config.dependencies[0].ports, vec![5432]);
    }

    #[test]
    fn test_path_defaults_after_parse() {
        let config = parser().parse(MANIFEST.as_bytes(), &env(&[])).unwrap();

        assert_eq!(config.services[0].path, DEFAULT_SERVICE_PATH);
        assert_eq!(config.services[1].path, "./worker");
    }

    #[test]
    fn test_parse_yaml_leaves_path_empty() {
        let config = ConfigParser::parse_yaml("services:\n  - name: web\n    port: 80\n").unwrap();
        assert!(config.services[0].path.is_empty());

        let mut config = config;
        normalize(&mut config);
        assert_eq!(config.services[0].path, "./");
    }

    #[test]
    fn test_unset_variable_fails_validation_not_expansion() {
        let err = parser().load_with(MANIFEST.as_bytes(), &env(&[])).unwrap_err();
        let violations = err.violations().unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "server.host");
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parser().parse(b"services: [name: web", &env(&[])).unwrap_err();
        assert!(matches!(
            err,
            ShipyardError::Config(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_service_env_file_loaded_after_expansion() {
        let dir = TempDir::new().unwrap();
        let service_dir = dir.path().join("api");
        std::fs::create_dir(&service_dir).unwrap();
        std::fs::write(
            service_dir.join(ENV_FILE),
            "SHIPYARD_TEST_SERVICE_ENV_LOADED=yes\n",
        )
        .unwrap();

        let manifest = format!(
            "services:\n  - name: api\n    port: 80\n    path: {}\n    command: ${{SHIPYARD_TEST_SERVICE_ENV_LOADED:-before}}\n",
            service_dir.display()
        );

        let config = ConfigParser::new()
            .with_base_path(dir.path())
            .parse(manifest.as_bytes(), &ProcessEnv)
            .unwrap();

        assert_eq!(config.services[0].command.as_deref(), Some("before"));
        assert_eq!(
            std::env::var("SHIPYARD_TEST_SERVICE_ENV_LOADED").as_deref(),
            Ok("yes")
        );
    }

    #[test]
    fn test_base_env_file_loaded_before_expansion() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ENV_FILE), "SHIPYARD_TEST_BASE_PORT=4321\n").unwrap();

        let config = ConfigParser::new()
            .with_base_path(dir.path())
            .parse(
                b"services:\n  - name: api\n    port: ${SHIPYARD_TEST_BASE_PORT:-80}\n    path: /nonexistent\n",
                &ProcessEnv,
            )
            .unwrap();

        assert_eq!(config.services[0].port, 4321);
    }

    #[test]
    fn test_base_env_file_does_not_override_set_variable() {
        let first = TempDir::new().unwrap();
        std::fs::write(first.path().join(ENV_FILE), "SHIPYARD_TEST_PRESET=fromenv\n").unwrap();
        ConfigParser::new().with_base_path(first.path()).load_dotenv().unwrap();

        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join(ENV_FILE), "SHIPYARD_TEST_PRESET=fromfile\n").unwrap();

        let config = ConfigParser::new()
            .with_base_path(second.path())
            .parse(
                b"services:\n  - name: ${SHIPYARD_TEST_PRESET}\n    port: 80\n    path: /nonexistent\n",
                &ProcessEnv,
            )
            .unwrap();

        assert_eq!(config.services[0].name, "fromenv");
    }

    #[test]
    fn test_empty_image_normalized_to_none() {
        let mut config = ConfigParser::parse_yaml(
            "services:\n  - name: web\n    image: ''\n    port: 80\n  - name: api\n    image: api:1\n    port: 81\n",
        )
        .unwrap();
        assert_eq!(config.services[0].image.as_deref(), Some(""));

        normalize(&mut config);
        assert_eq!(config.services[0].image, None);
        assert_eq!(config.services[1].image.as_deref(), Some("api:1"));
    }

    #[test]
    fn test_parse_file_skips_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipyard.yaml");
        std::fs::write(&path, "services:\n  - name: web\n    port: 70000\n").unwrap();

        let config = parser().parse_file(&path).unwrap();
        assert_eq!(config.services[0].port, 70000);

        let err = parser().load_file(&path).unwrap_err();
        assert!(err.violations().is_some());
    }

    #[test]
    fn test_load_file_reports_location_on_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipyard.yaml");
        std::fs::write(&path, "services: [name: web").unwrap();

        let err = parser().load_file(&path).unwrap_err();
        match err {
            ShipyardError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location, Some(path.display().to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_env_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ENV_FILE), "NOT VALID LINE 'unterminated\n").unwrap();

        let err = ConfigParser::new()
            .with_base_path(dir.path())
            .load_dotenv()
            .unwrap_err();
        assert!(matches!(err, ShipyardError::Config(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn test_missing_env_file_is_not_error() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigParser::new().with_base_path(dir.path()).load_dotenv().is_ok());
    }

    #[test]
    fn test_load_file_not_found() {
        let dir = TempDir::new().unwrap();
        let err = parser().load_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ShipyardError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("shipyard.yaml"), "services: []\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("shipyard.yaml"));
    }
}
