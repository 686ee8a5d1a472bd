//! viewsync - command-line driver for the view-sync engine.
//!
//! Decodes and rewrites list-view query strings, and drains saved page
//! responses into a bundle file.

mod cli;
mod commands;
mod transport;

use clap::Parser;
use viewsync_core::{ConfigError, EngineConfig};

use crate::cli::{Cli, Command};

// =============================================================================
// Logging
// =============================================================================

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let filter = EnvFilter::new(level);
        match "viewsync=debug".parse() {
            Ok(directive) if verbose == 0 => filter.add_directive(directive),
            _ => filter,
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// =============================================================================
// Configuration
// =============================================================================

/// Load the config file, falling back to defaults when there is none.
fn load_config(cli: &Cli) -> Result<EngineConfig, String> {
    let result = match &cli.config {
        Some(path) => EngineConfig::load(path),
        None => match EngineConfig::load_default() {
            Err(ConfigError::NoConfigDir) => {
                tracing::warn!("No config directory, using defaults");
                Ok(EngineConfig::default())
            }
            other => other,
        },
    };
    result.map_err(|e| format!("Failed to load config: {}", e))
}

// =============================================================================
// Entry Point
// =============================================================================

fn run(cli: Cli) -> Result<String, String> {
    let config = load_config(&cli)?;
    tracing::debug!("Config: {:?}", config);

    match &cli.command {
        Command::Query(args) => commands::query(args),
        Command::Update(args) => commands::update(args),
        Command::Export(args) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
            let path = rt.block_on(commands::export(args, &config))?;
            Ok(path.display().to_string())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
