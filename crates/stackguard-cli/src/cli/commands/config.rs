//! `stackguard config` - manage CLI configuration.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;
use std::str::FromStr;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub fn execute(_ctx: &Context, args: &ConfigArgs) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(key, value),
        ConfigCommands::Path => path(),
    }?;
    Ok(ExitCode::SUCCESS)
}

fn show() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Current configuration:".bold());
    println!("  key_id        = {}", config.key_id.as_deref().unwrap_or("(not set)"));
    println!(
        "  secret        = {}",
        if config.secret.is_some() { "<redacted>" } else { "(not set)" }
    );
    println!("  api_url       = {}", config.api_url.as_deref().unwrap_or("(default)"));
    println!(
        "  output_format = {}",
        config.output_format.map_or_else(|| "(default)".to_string(), |f| f.to_string())
    );

    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    match key {
        "key_id" => config.key_id = Some(value.to_string()),
        "secret" => config.secret = Some(value.to_string()),
        "api_url" => config.api_url = Some(value.to_string()),
        "output_format" => config.output_format = Some(OutputFormat::from_str(value)?),
        _ => anyhow::bail!(
            "Unknown configuration key: {key}\n\
             Valid keys: key_id, secret, api_url, output_format"
        ),
    }

    config.save()?;
    println!("{} {key} updated", "Saved:".green().bold());

    Ok(())
}

fn path() -> Result<()> {
    println!("{}", Config::path()?.display());
    Ok(())
}
