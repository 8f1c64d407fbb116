//! Core types and errors for the stackguard compliance gate.
//!
//! This crate provides the foundational pieces shared across the workspace:
//!
//! - **Types**: Strongly-typed representations of the compliance backend's
//!   responses (fetch status, assessment results) and of the gate's own
//!   artifacts (convergence results, failed-test reports)
//! - **Errors**: Comprehensive error handling with [`GuardError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use stackguard_core::{FailedTest, GuardError, Result};
//!
//! fn report(test: &FailedTest) -> Result<()> {
//!     println!("rule: {} ({})", test.rule_name, test.severity);
//!     for entity in &test.entities {
//!         println!("  {}", entity.describe());
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/stackguard-core/2.0.0")]

mod error;
pub mod types;

pub use error::{GuardError, Result};
pub use types::*;
