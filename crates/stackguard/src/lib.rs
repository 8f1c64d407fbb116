//! Cloud compliance gate for deployment pipelines.
//!
//! Forces the compliance backend to refresh its inventory of a cloud
//! account, waits until the refresh observably converges, executes a rule
//! bundle against the fresh inventory, and correlates failing entities back
//! to the deployed stack under test.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use stackguard::{
//!     CloudAccountRef, ComplianceClient, ComplianceGate, Credentials, GateConfig,
//!     ResourceTypeMapper,
//! };
//!
//! #[tokio::main]
//! async fn main() -> stackguard::Result<()> {
//!     let client = ComplianceClient::new(Credentials::new("key-id", "secret"));
//!     let mapper = ResourceTypeMapper::embedded()?;
//!
//!     let mut config = GateConfig::new(-15);
//!     config.region = Some("us-east-1".to_string());
//!
//!     let gate = ComplianceGate::new(&client, &mapper, config);
//!     let account = CloudAccountRef::ProviderNumber("123456789012".to_string());
//!     let report = gate.run_account(&account).await?;
//!
//!     println!("risk: {}", report.risk);
//!     for test in &report.failed_tests {
//!         println!("failed: {} ({})", test.rule_name, test.severity);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for TLS
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/stackguard/2.0.0")]

// Re-export core types
pub use stackguard_core::*;

// Re-export client
pub use stackguard_client::{ComplianceClient, ComplianceClientBuilder, Credentials};

// Re-export gate logic
pub use stackguard_check::*;

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;
