//! Service fingerprints for change detection.
//!
//! A fingerprint is the SHA-256 of a canonical JSON rendering of a service's
//! desired state. Canonicalization is written out per field:
//!
//! - runtime-only fields (`image_updated`, `local_ports`) are left out
//! - every top-level sequence is re-ordered by the canonical string of its
//!   elements, so authoring order does not matter but set membership does
//! - objects are `serde_json::Map`, which is `BTreeMap`-backed, so keys are
//!   alphabetized at every level of nesting

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ConfigError, Result, ShipyardError};

use super::spec::Service;

/// Number of hex characters shown by [`Fingerprinter::short`].
const SHORT_LEN: usize = 12;

/// Canonical form: field name to canonical value, alphabetized by name.
pub type CanonicalForm = BTreeMap<&'static str, Value>;

/// Computes service fingerprints.
#[derive(Debug, Default)]
pub struct Fingerprinter;

impl Fingerprinter {
    /// Creates a new fingerprinter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the 64-character lowercase hex fingerprint of `service`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a field cannot be encoded.
    pub fn fingerprint(&self, service: &Service) -> Result<String> {
        let canonical = canonical_form(service)?;
        let bytes = serde_json::to_vec(&canonical)
            .map_err(|e| serialization_error(service, &e))?;

        let digest = hex::encode(Sha256::digest(&bytes));
        debug!("Fingerprint for service '{}': {}", service.name, digest);
        Ok(digest)
    }

    /// Shortened fingerprint for display.
    #[must_use]
    pub fn short(fingerprint: &str) -> &str {
        fingerprint.get(..SHORT_LEN).unwrap_or(fingerprint)
    }

    /// Whether the running container must be recreated.
    ///
    /// True when the service forces recreation, nothing was recorded, or
    /// the desired state no longer matches `previous`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the fingerprint cannot be computed.
    pub fn needs_recreate(&self, service: &Service, previous: Option<&str>) -> Result<bool> {
        if service.recreate {
            return Ok(true);
        }
        let Some(previous) = previous else {
            return Ok(true);
        };
        Ok(self.fingerprint(service)? != previous)
    }
}

impl Service {
    /// Returns this service's fingerprint.
    ///
    /// # Errors
    ///
    /// See [`Fingerprinter::fingerprint`].
    pub fn fingerprint(&self) -> Result<String> {
        Fingerprinter::new().fingerprint(self)
    }
}

/// Builds the canonical form of a service's desired state.
///
/// # Errors
///
/// Returns a serialization error if a field cannot be encoded.
pub fn canonical_form(service: &Service) -> Result<CanonicalForm> {
    let mut form = CanonicalForm::new();
    form.insert("name", encode(service, &service.name)?);
    form.insert("image", encode(service, &service.image)?);
    form.insert("port", encode(service, &service.port)?);
    form.insert("path", encode(service, &service.path)?);
    form.insert("health_check", encode(service, &service.health_check)?);
    form.insert("routes", sorted(service, &service.routes)?);
    form.insert("volumes", sorted(service, &service.volumes)?);
    form.insert("command", encode(service, &service.command)?);
    form.insert("entrypoint", sorted(service, &service.entrypoint)?);
    form.insert("env", sorted(service, &service.env)?);
    form.insert("forwards", sorted(service, &service.forwards)?);
    form.insert("recreate", encode(service, &service.recreate)?);
    form.insert("hooks", encode(service, &service.hooks)?);
    form.insert("container", encode(service, &service.container)?);
    Ok(form)
}

fn encode<T: Serialize>(service: &Service, field: &T) -> Result<Value> {
    serde_json::to_value(field).map_err(|e| serialization_error(service, &e))
}

/// Encodes each element and orders them by their canonical string.
fn sorted<T: Serialize>(service: &Service, items: &[T]) -> Result<Value> {
    let mut keyed = items
        .iter()
        .map(|item| {
            let value = serde_json::to_value(item)?;
            let key = serde_json::to_string(&value)?;
            Ok((key, value))
        })
        .collect::<std::result::Result<Vec<_>, serde_json::Error>>()
        .map_err(|e| serialization_error(service, &e))?;

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(Value::Array(keyed.into_iter().map(|(_, value)| value).collect()))
}

fn serialization_error(service: &Service, err: &serde_json::Error) -> ShipyardError {
    ShipyardError::Config(ConfigError::Serialization {
        service: service.name.clone(),
        message: err.to_string(),
    })
}
