//! Shipyard CLI entrypoint.
//!
//! This is the main entrypoint for the shipyard command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use shipyard::build::{ImagePipeline, LocalExecutor, Progress};
use shipyard::cli::{Cli, Commands, OutputFormatter, ServiceFingerprint};
use shipyard::config::{find_config_file, Config, ConfigParser, ConfigValidator, Fingerprinter, Service};
use shipyard::error::{Result, ShipyardError};

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(violations) = e.violations() {
                eprint!("{}", formatter.format_violations(violations));
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.config.as_ref(), warnings, formatter),
        Commands::Fingerprint { services } => {
            cmd_fingerprint(cli.config.as_ref(), &services, formatter)
        }
        Commands::Build { services, tool, no_progress } => {
            cmd_build(cli.config.as_ref(), &services, tool, no_progress).await
        }
    }
}

/// Validate the manifest.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    let config = ConfigParser::new().parse_file(&config_file)?;
    let report = ConfigValidator::new().validate(&config)?;

    println!("{}", formatter.format_validation(&config, &report, show_warnings));
    Ok(())
}

/// Print service fingerprints.
fn cmd_fingerprint(
    config_path: Option<&PathBuf>,
    names: &[String],
    formatter: &OutputFormatter,
) -> Result<()> {
    let config = load_config(config_path)?;
    let fingerprinter = Fingerprinter::new();

    let fingerprints = select_services(&config, names)?
        .into_iter()
        .map(|service| {
            Ok(ServiceFingerprint {
                name: service.name.clone(),
                fingerprint: fingerprinter.fingerprint(service)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    print!("{}", formatter.format_fingerprints(&fingerprints));
    Ok(())
}

/// Build and push service images.
async fn cmd_build(
    config_path: Option<&PathBuf>,
    names: &[String],
    tool: String,
    no_progress: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let progress = if no_progress { Progress::Hidden } else { Progress::Spinner };
    let pipeline = ImagePipeline::new(LocalExecutor::new())
        .with_tool(tool)
        .with_progress(progress);

    for service in select_services(&config, names)? {
        let Some(image) = service.image.as_deref() else {
            if !names.is_empty() {
                warn!("Service '{}' declares no image; nothing to build", service.name);
            }
            continue;
        };

        info!("Building service '{}'", service.name);
        pipeline.deploy(image, Path::new(&service.path)).await?;
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the manifest path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads and validates the manifest.
fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading manifest from: {}", config_file.display());

    ConfigParser::new().load_file(&config_file)
}

/// Selects services by name, or all of them when `names` is empty.
fn select_services<'a>(config: &'a Config, names: &[String]) -> Result<Vec<&'a Service>> {
    if names.is_empty() {
        return Ok(config.services.iter().collect());
    }

    names
        .iter()
        .map(|name| {
            config
                .service(name)
                .ok_or_else(|| ShipyardError::internal(format!("Unknown service: {name}")))
        })
        .collect()
}
