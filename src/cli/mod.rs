//! CLI module for the Shipyard deployment tool.
//!
//! This module provides the command-line interface for validating
//! manifests, printing fingerprints, and building images.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{OutputFormatter, ServiceFingerprint};
