//! Deployed-stack resource inventory.

use crate::mapping::ResourceTypeMapper;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stackguard_core::Result;
use std::collections::HashSet;
use tracing::debug;

/// One physical resource belonging to a deployed stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackResource {
    /// Provider-native resource type (e.g. `AWS::EC2::SecurityGroup`)
    pub resource_type: String,

    /// Physical resource identifier
    pub physical_id: String,
}

/// Source of a stack's physical resources.
///
/// Implementations drain pagination themselves; the gate consumes the full
/// list in one call.
#[async_trait]
pub trait StackResourceProvider: Send + Sync {
    /// List every physical resource of the named stack
    async fn list_physical_resources(&self, stack_name: &str) -> Result<Vec<StackResource>>;
}

/// Physical-id set of one deployed stack, restricted to resource types the
/// mapping table recognizes.
///
/// Built once per stack-scoped run and read-only afterwards; this is the
/// lookup side of the correlation fallback chain.
#[derive(Debug, Clone)]
pub struct StackResourceInventory {
    stack_name: String,
    physical_ids: HashSet<String>,
}

impl StackResourceInventory {
    /// Build the inventory from a drained resource list
    #[must_use]
    pub fn from_resources(
        mapper: &ResourceTypeMapper,
        stack_name: impl Into<String>,
        resources: &[StackResource],
    ) -> Self {
        let stack_name = stack_name.into();
        let physical_ids: HashSet<String> = resources
            .iter()
            .filter(|r| mapper.is_recognized(&r.resource_type))
            .map(|r| r.physical_id.clone())
            .collect();

        debug!(
            stack = %stack_name,
            resources = resources.len(),
            recognized = physical_ids.len(),
            "built stack inventory"
        );

        Self {
            stack_name,
            physical_ids,
        }
    }

    /// The stack this inventory belongs to
    #[must_use]
    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Whether an identifier is one of the stack's physical ids
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.physical_ids.contains(id)
    }

    /// Number of recognized physical resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.physical_ids.len()
    }

    /// True when no recognized resources were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.physical_ids.is_empty()
    }
}
