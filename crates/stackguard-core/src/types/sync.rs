use super::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Acknowledgement returned when a full inventory refresh is requested
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncNowAck {
    /// Backend workflow id for the refresh, when one is assigned
    #[serde(default)]
    pub workflow_id: Option<String>,

    /// Free-form status message
    #[serde(default)]
    pub message: Option<String>,
}

/// One row of the backend's entity fetch status table.
///
/// At most one row per (entity type, region) pair is authoritative; when the
/// backend reports duplicates, the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStatusEntry {
    /// Entity type this row describes
    pub entity_type: EntityType,

    /// Backend region spelling (`us_east_1`), empty for global entities
    #[serde(default)]
    pub region: String,

    /// When the backend last finished fetching this entity type
    #[serde(default)]
    pub last_successful_run: Option<DateTime<Utc>>,
}

/// How a convergence wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceOutcome {
    /// Every relevant entity type was fetched after the baseline
    Converged,
    /// The wall-clock budget ran out with types still pending
    TimedOut,
    /// The completed count went backwards between polls; the backend is
    /// unstable and the wait stopped rather than mask it
    Regressed,
}

impl ConvergenceOutcome {
    /// Returns true if the wait ended with full convergence
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl std::fmt::Display for ConvergenceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Regressed => write!(f, "regressed"),
        }
    }
}

/// Result of one convergence wait.
///
/// `completed` and `pending` are disjoint and together cover exactly the
/// relevant entity types of the wait. Timing is per call; there is no
/// process-global clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConvergenceResult {
    /// Entity types fetched after the baseline
    pub completed: Vec<EntityType>,

    /// Entity types still waiting on a fresh fetch
    pub pending: Vec<EntityType>,

    /// Pending types that never appeared in any status snapshot over the
    /// whole wait. A non-empty list usually means the mapping table names
    /// an entity type the backend does not report.
    pub never_observed: Vec<EntityType>,

    /// How the wait ended
    pub outcome: ConvergenceOutcome,

    /// Wall-clock time spent in the wait
    pub elapsed: Duration,
}

impl SyncConvergenceResult {
    /// Returns true if every relevant type converged
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.outcome.is_converged() && self.pending.is_empty()
    }

    /// Number of types whose fetch completed after the baseline
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_entry_parses_backend_shape() {
        let entry: FetchStatusEntry = serde_json::from_str(
            r#"{"entityType":"SecurityGroup","region":"us_east_1","lastSuccessfulRun":"2026-08-08T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(entry.entity_type.as_str(), "SecurityGroup");
        assert_eq!(entry.region, "us_east_1");
        assert!(entry.last_successful_run.is_some());
    }

    #[test]
    fn fetch_status_entry_tolerates_missing_fields() {
        let entry: FetchStatusEntry = serde_json::from_str(r#"{"entityType":"Lambda"}"#).unwrap();
        assert_eq!(entry.region, "");
        assert!(entry.last_successful_run.is_none());
    }
}
