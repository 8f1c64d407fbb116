//! # stackguard-cli
//!
//! Command-line interface for the stackguard compliance gate.
//!
//! ## Commands
//!
//! - **sync**: force an inventory refresh and wait until it converges
//! - **assess**: execute a rule bundle and correlate failures to a stack
//! - **gate**: the full pipeline gate (sync, assess, correlate, score)
//! - **config**: manage CLI configuration
//!
//! Exit codes follow pipeline conventions: `0` success, `1` the inventory
//! did not converge, `2` the severity gate tripped.

pub mod cli;
pub mod config;
pub mod output;
pub mod resources;

pub use cli::run;
