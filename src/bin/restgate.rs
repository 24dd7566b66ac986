use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use restgate::{AdmissionConfig, ServiceSpec, SpecValidator, ValidationResult};

#[derive(Parser)]
#[command(name = "restgate")]
#[command(about = "Validate service specs and admission control settings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a service spec (JSON, or YAML for .yaml/.yml files)
    Validate {
        /// Path to the spec file
        spec: PathBuf,
    },
    /// Check an admission config file and print the effective settings
    CheckConfig {
        /// Path to the YAML config file
        config: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { spec } => validate(&spec),
        Commands::CheckConfig { config } => check_config(&config),
    }
}

fn load_spec(path: &Path) -> Result<ServiceSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read spec file: {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let spec = if is_yaml {
        ServiceSpec::from_yaml_str(&raw)
    } else {
        ServiceSpec::from_json_str(&raw)
    };
    spec.with_context(|| format!("Failed to parse spec: {}", path.display()))
}

fn validate(path: &Path) -> Result<ExitCode> {
    let spec = load_spec(path)?;

    match SpecValidator::new().validate(&spec) {
        ValidationResult::Valid => {
            info!(project = %spec.project_name, routes = spec.routes.len(), "spec is valid");
            println!("{}: valid ({} routes)", spec.project_name, spec.routes.len());
            Ok(ExitCode::SUCCESS)
        }
        ValidationResult::Invalid(violations) => {
            println!("{}: {} violation(s)", path.display(), violations.len());
            for violation in &violations {
                println!("  - {}", violation);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check_config(path: &Path) -> Result<ExitCode> {
    let config = AdmissionConfig::from_path(path)?;
    let gate = config
        .build_gate()
        .with_context(|| format!("Invalid admission config: {}", path.display()))?;

    #[cfg(feature = "async")]
    config
        .sweeper_config()
        .with_context(|| format!("Invalid sweeper settings: {}", path.display()))?;

    let policy = config.rate_limit;
    if gate.is_enabled() {
        println!(
            "rate limit: {} requests per {}s window",
            policy.max_requests_per_window, policy.window_size_seconds
        );
    } else {
        println!("rate limit: disabled");
    }
    println!("identity header: {}", gate.resolver().identity_header());
    match config.max_clients {
        Some(max) => println!("max clients: {}", max),
        None => println!("max clients: unlimited"),
    }
    println!(
        "idle eviction: every {}s, after {} windows",
        config.sweep_interval_secs, config.idle_multiplier
    );
    Ok(ExitCode::SUCCESS)
}
