//! Command-line argument definitions using clap.

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pipeline compliance gate for cloud stacks
///
/// Force the compliance backend to refresh its inventory, wait until the
/// refresh converges, execute a rule bundle and fail the pipeline when the
/// deployed stack violates it.
#[derive(Parser, Debug)]
#[command(name = "stackguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// API key id (or set STACKGUARD_KEY_ID env var)
    #[arg(long, env = "STACKGUARD_KEY_ID", global = true)]
    pub key_id: Option<String>,

    /// API secret (or set STACKGUARD_SECRET env var)
    #[arg(long, env = "STACKGUARD_SECRET", global = true, hide_env_values = true)]
    pub secret: Option<String>,

    /// Override the backend API base URL
    #[arg(long, env = "STACKGUARD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Force an inventory refresh and wait until it converges
    Sync(SyncArgs),

    /// Execute a rule bundle and correlate failures to a stack
    Assess(AssessArgs),

    /// Full pipeline gate: sync, assess, correlate, score
    Gate(GateArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

/// Account and stack scoping shared by the run commands
#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// Provider account number to run against
    #[arg(long)]
    pub account_number: Option<String>,

    /// The backend's own cloud account id (skips account resolution)
    #[arg(long)]
    pub backend_account_id: Option<String>,

    /// Region the stack was deployed to (provider spelling, e.g. us-east-1)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Restrict the run to one deployed stack
    #[arg(long, requires = "resources_file")]
    pub stack_name: Option<String>,

    /// Drained stack resource listing (JSON) for stack-scoped runs
    #[arg(long, requires = "stack_name")]
    pub resources_file: Option<PathBuf>,
}

// ============================================================================
// Sync command
// ============================================================================

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Entity types not waited on (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub excluded_types: Vec<String>,

    /// Maximum time to wait for convergence, in minutes
    #[arg(long, default_value = "10")]
    pub max_timeout_minutes: u64,
}

// ============================================================================
// Assess command
// ============================================================================

#[derive(Args, Debug)]
pub struct AssessArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// The rule bundle id to execute
    #[arg(long, allow_hyphen_values = true)]
    pub bundle_id: i64,

    /// Minimum severity that fails the pipeline (High/Medium/Low)
    #[arg(long)]
    pub min_severity: Option<String>,

    /// Score any failure as 100 instead of tiering by severity
    #[arg(long)]
    pub flat_risk: bool,

    /// Write the failed-test report as JSON to this path
    #[arg(long, env = "STACKGUARD_RESULT_FILE")]
    pub result_file: Option<PathBuf>,
}

// ============================================================================
// Gate command
// ============================================================================

#[derive(Args, Debug)]
pub struct GateArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// The rule bundle id to execute
    #[arg(long, allow_hyphen_values = true)]
    pub bundle_id: i64,

    /// Entity types not waited on (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub excluded_types: Vec<String>,

    /// Maximum time to wait for convergence, in minutes
    #[arg(long, default_value = "10")]
    pub max_timeout_minutes: u64,

    /// Minimum severity that fails the pipeline (High/Medium/Low)
    #[arg(long)]
    pub min_severity: Option<String>,

    /// Score any failure as 100 instead of tiering by severity
    #[arg(long)]
    pub flat_risk: bool,

    /// Run the assessment even if the convergence wait timed out
    #[arg(long)]
    pub assess_on_timeout: bool,

    /// Write the failed-test report as JSON to this path
    #[arg(long, env = "STACKGUARD_RESULT_FILE")]
    pub result_file: Option<PathBuf>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Key to set (e.g. key_id, api_url, output_format)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}
