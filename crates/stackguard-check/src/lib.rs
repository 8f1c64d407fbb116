//! Core gate logic for stackguard.
//!
//! This crate holds the pieces with actual decisions in them:
//!
//! - [`mapping::ResourceTypeMapper`] - native resource types to the
//!   backend's entity-type vocabulary
//! - [`poller::SyncPoller`] - inventory refresh convergence under partial
//!   or regressing progress and a wall-clock budget
//! - [`runner::AssessmentRunner`] - rule-bundle execution
//! - [`correlate`] - tracing failing entities back to a deployed stack
//!   through the tag/id/name/arn fallback chain
//! - [`risk`] - reducing correlated failures to a risk score
//! - [`gate::ComplianceGate`] - the whole pipeline in one call

#![doc(html_root_url = "https://docs.rs/stackguard-check/2.0.0")]

pub mod correlate;
pub mod gate;
pub mod inventory;
pub mod mapping;
pub mod poller;
pub mod risk;
pub mod runner;

pub use correlate::{analyze, MatchTier, STACK_NAME_TAG};
pub use gate::{ComplianceGate, GateConfig, GateReport};
pub use inventory::{StackResource, StackResourceInventory, StackResourceProvider};
pub use mapping::ResourceTypeMapper;
pub use poller::{
    AccountSyncBackend, PollConfig, SyncBackend, SyncPoller, DEFAULT_MAX_WAIT,
    DEFAULT_POLL_INTERVAL,
};
pub use risk::{severity_gate_tripped, RiskPolicy};
pub use runner::AssessmentRunner;
