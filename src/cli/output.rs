//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{Config, Fingerprinter, ValidationReport};
use crate::error::Violation;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// A service and its fingerprint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceFingerprint {
    /// Service name.
    pub name: String,
    /// Full fingerprint.
    pub fingerprint: String,
}

/// Fingerprint row for table display.
#[derive(Tabled)]
struct FingerprintRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Fingerprint")]
    fingerprint: String,
}

/// Service row for the validation summary.
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Port")]
    port: i64,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "Routes")]
    routes: usize,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the summary of a valid manifest.
    #[must_use]
    pub fn format_validation(
        &self,
        config: &Config,
        report: &ValidationReport,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson {
                valid: report.is_valid(),
                project: config.project.name.clone(),
                services: config.services.len(),
                dependencies: config.dependencies.len(),
                warnings: report.warnings.clone(),
            })
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_validation_text(config, report, show_warnings),
        }
    }

    fn format_validation_text(
        config: &Config,
        report: &ValidationReport,
        show_warnings: bool,
    ) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "{} Manifest is valid", "✓".green());
        let _ = writeln!(output, "\nProject: {} ({})", config.project.name, config.project.domain);

        let rows: Vec<ServiceRow> = config
            .services
            .iter()
            .map(|s| ServiceRow {
                name: s.name.clone(),
                port: s.port,
                image: s.image.clone().unwrap_or_else(|| String::from("-")),
                routes: s.routes.len(),
            })
            .collect();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = writeln!(output, "\nDependencies: {}", config.dependencies.len());

        if show_warnings && !report.warnings.is_empty() {
            let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
            for warning in &report.warnings {
                let _ = writeln!(output, "   - {warning}");
            }
        }

        output
    }

    /// Formats validation violations.
    #[must_use]
    pub fn format_violations(&self, violations: &[Violation]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(
                &violations
                    .iter()
                    .map(|v| ViolationJson {
                        field: v.field.clone(),
                        message: v.message.clone(),
                    })
                    .collect::<Vec<_>>(),
            )
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(
                    output,
                    "{} {} violation(s):",
                    "✗".red(),
                    violations.len()
                );
                for violation in violations {
                    let _ = writeln!(output, "   - {}: {}", violation.field.bold(), violation.message);
                }
                output
            }
        }
    }

    /// Formats service fingerprints.
    #[must_use]
    pub fn format_fingerprints(&self, fingerprints: &[ServiceFingerprint]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(fingerprints).unwrap_or_default(),
            OutputFormat::Text => {
                if fingerprints.is_empty() {
                    return String::from("No services selected.\n");
                }
                let rows: Vec<FingerprintRow> = fingerprints
                    .iter()
                    .map(|f| FingerprintRow {
                        name: f.name.clone(),
                        fingerprint: Fingerprinter::short(&f.fingerprint).to_string(),
                    })
                    .collect();
                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct ValidationJson {
    valid: bool,
    project: String,
    services: usize,
    dependencies: usize,
    warnings: Vec<String>,
}

#[derive(serde::Serialize)]
struct ViolationJson {
    field: String,
    message: String,
}
