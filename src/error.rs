//! Error types for the Shipyard deployment tool.
//!
//! This module provides the error hierarchy for every stage of a manifest's
//! life: `.env` loading, expansion, parsing, validation, fingerprinting, and
//! the image build/push pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Shipyard deployment tool.
#[derive(Debug, Error)]
pub enum ShipyardError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image pipeline errors.
    #[error("Image pipeline error: {0}")]
    Build(#[from] BuildError),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest file was not found.
    #[error("Manifest not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("Failed to load env file {path}: {message}")]
    EnvFile {
        /// Path to the env file.
        path: PathBuf,
        /// Underlying loader message.
        message: String,
    },

    /// The manifest could not be parsed.
    #[error("Failed to parse manifest: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// One or more validation rules failed.
    #[error("Manifest validation failed with {} violation(s):\n{}", .violations.len(), Violations(.violations))]
    ValidationFailed {
        /// Every violation found, in traversal order.
        violations: Vec<Violation>,
    },

    /// A service could not be encoded for fingerprinting.
    #[error("Failed to serialize service '{service}': {message}")]
    Serialization {
        /// Service being fingerprinted.
        service: String,
        /// Encoder message.
        message: String,
    },
}

/// A single validation violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `services[0].port`.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Display adapter rendering one violation per line.
struct Violations<'a>(&'a [Violation]);

impl fmt::Display for Violations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {violation}")?;
        }
        Ok(())
    }
}

/// Step of the image pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// `build` of the image from its context directory.
    Build,
    /// `push` of the image to its registry.
    Push,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Push => write!(f, "push"),
        }
    }
}

/// Image pipeline errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A pipeline step failed; later steps were not run.
    #[error("Failed to {step} image '{image}': {message}")]
    StepFailed {
        /// The step that failed.
        step: BuildStep,
        /// Image being processed.
        image: String,
        /// Underlying failure.
        message: String,
    },

    /// An external command exited unsuccessfully.
    #[error("Command '{command}' failed with {status}: {stderr}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// An external command could not be started.
    #[error("Failed to start '{command}': {message}")]
    Spawn {
        /// Program name.
        command: String,
        /// OS error message.
        message: String,
    },
}

/// Result type alias for Shipyard operations.
pub type Result<T> = std::result::Result<T, ShipyardError>;

impl ShipyardError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the validation violations if this is a validation failure.
    #[must_use]
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Config(ConfigError::ValidationFailed { violations }) => Some(violations),
            _ => None,
        }
    }

    /// Returns the failed pipeline step, if this error came from the image pipeline.
    #[must_use]
    pub const fn failed_step(&self) -> Option<BuildStep> {
        match self {
            Self::Build(BuildError::StepFailed { step, .. }) => Some(*step),
            _ => None,
        }
    }
}

impl ConfigError {
    /// Creates a parse error without a source location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }
}
