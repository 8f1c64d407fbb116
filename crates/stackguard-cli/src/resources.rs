//! File-backed stack resource provider.
//!
//! The pipeline step that has cloud credentials drains the stack-description
//! API and writes the listing to a JSON file; this provider reads it back so
//! the gate itself never needs provider credentials.

use serde::{Deserialize, Serialize};
use stackguard::{GuardError, Result, StackResource, StackResourceProvider};
use std::path::Path;

/// A drained stack resource listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceListing {
    /// Provider account the listing was drained from
    #[serde(default)]
    pub account_number: Option<String>,

    /// Stack the listing belongs to
    pub stack_name: String,

    /// Fully de-paginated resource list
    pub resources: Vec<StackResource>,
}

/// [`StackResourceProvider`] over a listing file
#[derive(Debug)]
pub struct FileStackResourceProvider {
    listing: ResourceListing,
}

impl FileStackResourceProvider {
    /// Load a listing file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!("could not read resources file {}: {e}", path.display()))
        })?;
        let listing: ResourceListing = serde_json::from_str(&content).map_err(|e| {
            GuardError::Config(format!("could not parse resources file {}: {e}", path.display()))
        })?;
        Ok(Self { listing })
    }

    /// Verify the listing was drained from the expected provider account.
    ///
    /// Mirrors the pipeline sanity check: running the gate against one
    /// account with a listing from another silently correlates nothing.
    pub fn verify_account(&self, expected: Option<&str>) -> Result<()> {
        match (expected, self.listing.account_number.as_deref()) {
            (Some(expected), Some(actual)) if expected != actual => Err(GuardError::Config(format!(
                "resources file was drained from account {actual}, but the run targets {expected}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl StackResourceProvider for FileStackResourceProvider {
    async fn list_physical_resources(&self, stack_name: &str) -> Result<Vec<StackResource>> {
        if stack_name != self.listing.stack_name {
            return Err(GuardError::Config(format!(
                "resources file describes stack {}, not {stack_name}",
                self.listing.stack_name
            )));
        }
        Ok(self.listing.resources.clone())
    }
}
