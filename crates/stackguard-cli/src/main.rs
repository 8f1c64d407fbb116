//! stackguard - Pipeline compliance gate CLI
//!
//! Refresh the compliance backend's inventory, wait for convergence, run a
//! rule bundle, and fail the pipeline when the deployed stack violates it.

use colored::Colorize;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match stackguard_cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
