//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config = Config::load()?;

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    // Credentials from CLI/env, falling back to config
    let key_id = cli.key_id.or_else(|| config.key_id.clone());
    let secret = cli.secret.or_else(|| config.secret.clone());
    let api_url = cli.api_url.or_else(|| config.api_url.clone());

    // Create context for commands
    let ctx = commands::Context {
        key_id,
        secret,
        api_url,
        output_format,
        verbose: cli.verbose,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Sync(args) => commands::sync::execute(ctx, args).await,
        Commands::Assess(args) => commands::assess::execute(ctx, args).await,
        Commands::Gate(args) => commands::gate::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(&ctx, &args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
