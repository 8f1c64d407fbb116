//! Inventory convergence polling.
//!
//! Forces the compliance backend to refresh its inventory of an account,
//! then polls the per-entity-type fetch status until every relevant type has
//! been fetched after the baseline, the wall-clock budget runs out, or the
//! backend's progress goes backwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stackguard_client::ComplianceClient;
use stackguard_core::{
    backend_region, CloudAccountRef, ConvergenceOutcome, EntityType, FetchStatusEntry, GuardError,
    Result, SyncConvergenceResult,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Fixed pause between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default wall-clock budget for one convergence wait
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10 * 60);

/// The two backend calls the poller needs, bound to one account.
///
/// Split out as a trait so the loop can be driven by a fake in tests.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Kick off a full inventory refresh
    async fn trigger_sync(&self) -> Result<()>;

    /// Read the current per-entity-type fetch status table
    async fn fetch_status(&self) -> Result<Vec<FetchStatusEntry>>;
}

/// [`SyncBackend`] over the real compliance client
pub struct AccountSyncBackend<'a> {
    client: &'a ComplianceClient,
    account: CloudAccountRef,
}

impl<'a> AccountSyncBackend<'a> {
    /// Bind the client to one account
    #[must_use]
    pub const fn new(client: &'a ComplianceClient, account: CloudAccountRef) -> Self {
        Self { client, account }
    }
}

#[async_trait]
impl SyncBackend for AccountSyncBackend<'_> {
    async fn trigger_sync(&self) -> Result<()> {
        let backend_id = self.client.accounts().resolve(&self.account).await?;
        self.client.sync().trigger(&backend_id).await?;
        Ok(())
    }

    async fn fetch_status(&self) -> Result<Vec<FetchStatusEntry>> {
        let number = self.account.provider_number().ok_or_else(|| {
            GuardError::Config(
                "fetch status is keyed by the provider account number".to_string(),
            )
        })?;
        self.client.sync().fetch_status(number).await
    }
}

/// Poll loop configuration
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between polls
    pub interval: Duration,

    /// Provider region to restrict the status table to; entries with no
    /// region (global entities) always pass the filter
    pub region: Option<String>,

    /// Entity types never waited on, even in full-account mode
    pub excluded_types: BTreeSet<EntityType>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            region: None,
            excluded_types: BTreeSet::new(),
        }
    }
}

/// Inventory convergence poller
pub struct SyncPoller<B> {
    backend: B,
    config: PollConfig,
}

impl<B: SyncBackend> SyncPoller<B> {
    /// Create a poller with default configuration
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PollConfig::default())
    }

    /// Create a poller with explicit configuration
    #[must_use]
    pub const fn with_config(backend: B, config: PollConfig) -> Self {
        Self { backend, config }
    }

    /// Trigger a refresh and wait until every relevant entity type has been
    /// fetched after the trigger baseline.
    ///
    /// `relevant` of `None` means full-account mode: wait on everything the
    /// backend reports, minus the configured exclusions. Timeout and
    /// regression are normal returns distinguished by
    /// [`SyncConvergenceResult::outcome`], never errors. The loop never
    /// blocks past `max_wait` plus one in-flight poll.
    pub async fn wait_for_convergence(
        &self,
        relevant: Option<&BTreeSet<EntityType>>,
        max_wait: Duration,
    ) -> SyncConvergenceResult {
        let baseline = Utc::now();
        let started = Instant::now();
        info!(baseline = %baseline, max_wait_secs = max_wait.as_secs(), "starting refresh wait");

        if let Err(e) = self.backend.trigger_sync().await {
            // The backend may already be converging from an earlier trigger,
            // so polling can still succeed.
            warn!(error = %e, "refresh trigger failed; polling anyway");
        }

        let region = self.config.region.as_deref().map(backend_region);
        let mut observed: BTreeSet<EntityType> = BTreeSet::new();
        let mut previous: Option<Progress> = None;

        loop {
            if started.elapsed() >= max_wait {
                warn!(
                    elapsed_secs = started.elapsed().as_secs(),
                    "refresh wait exceeded its budget"
                );
                return finish(
                    ConvergenceOutcome::TimedOut,
                    previous,
                    relevant,
                    &observed,
                    started.elapsed(),
                );
            }

            let snapshot = match self.backend.fetch_status().await {
                Ok(rows) => rows,
                Err(e) => {
                    // Transient: skip classification entirely this iteration
                    // so a missing snapshot is neither progress nor
                    // regression. The budget check above still bounds us.
                    warn!(error = %e, "status poll failed; will retry");
                    self.pause(started, max_wait).await;
                    continue;
                }
            };

            let snapshot = self.filter_snapshot(snapshot, relevant, region.as_deref());
            observed.extend(snapshot.iter().map(|e| e.entity_type.clone()));

            let scope: BTreeSet<EntityType> = match relevant {
                Some(set) => set.clone(),
                None => snapshot.iter().map(|e| e.entity_type.clone()).collect(),
            };
            let (completed, pending) = classify(&scope, &snapshot, baseline);

            if let Some(prev) = &previous {
                if completed.len() < prev.completed.len() {
                    warn!(
                        was = prev.completed.len(),
                        now = completed.len(),
                        "completed count went backwards; stopping"
                    );
                    debug!(previous = ?prev.snapshot, current = ?snapshot, "fetch status difference");
                    return finish(
                        ConvergenceOutcome::Regressed,
                        previous,
                        relevant,
                        &observed,
                        started.elapsed(),
                    );
                }
            }

            info!(
                completed = completed.len(),
                pending = pending.len(),
                "refresh progress"
            );

            if pending.is_empty() {
                return SyncConvergenceResult {
                    completed,
                    pending,
                    never_observed: Vec::new(),
                    outcome: ConvergenceOutcome::Converged,
                    elapsed: started.elapsed(),
                };
            }

            previous = Some(Progress {
                completed,
                pending,
                snapshot,
            });
            debug!("not converged yet; sleeping before next poll");
            self.pause(started, max_wait).await;
        }
    }

    /// Sleep the poll interval, clipped so the loop wakes when the budget ends
    async fn pause(&self, started: Instant, max_wait: Duration) {
        let remaining = max_wait.saturating_sub(started.elapsed());
        tokio::time::sleep(self.config.interval.min(remaining)).await;
    }

    /// Restrict a raw status table to the wait's scope and region
    fn filter_snapshot(
        &self,
        snapshot: Vec<FetchStatusEntry>,
        relevant: Option<&BTreeSet<EntityType>>,
        region: Option<&str>,
    ) -> Vec<FetchStatusEntry> {
        snapshot
            .into_iter()
            .filter(|entry| match relevant {
                Some(set) => set.contains(&entry.entity_type),
                None => !self.config.excluded_types.contains(&entry.entity_type),
            })
            .filter(|entry| {
                region.map_or(true, |r| entry.region == r || entry.region.is_empty())
            })
            .collect()
    }
}

/// Progress captured after one classification pass
struct Progress {
    completed: Vec<EntityType>,
    pending: Vec<EntityType>,
    snapshot: Vec<FetchStatusEntry>,
}

/// Classify every relevant entity type as completed or pending.
///
/// A type absent from the snapshot is pending: absence is not success. A
/// present type completed iff its last successful run is strictly after the
/// baseline. When the backend reports duplicate rows for a type, the first
/// row wins. The two returned sets are disjoint and together cover exactly
/// the relevant set.
#[must_use]
pub fn classify(
    relevant: &BTreeSet<EntityType>,
    snapshot: &[FetchStatusEntry],
    baseline: DateTime<Utc>,
) -> (Vec<EntityType>, Vec<EntityType>) {
    let mut completed = Vec::new();
    let mut pending = Vec::new();

    for entity_type in relevant {
        let row = snapshot.iter().find(|e| e.entity_type == *entity_type);
        let fresh = row
            .and_then(|e| e.last_successful_run)
            .is_some_and(|t| t > baseline);
        if fresh {
            completed.push(entity_type.clone());
        } else {
            pending.push(entity_type.clone());
        }
    }

    (completed, pending)
}

fn finish(
    outcome: ConvergenceOutcome,
    previous: Option<Progress>,
    relevant: Option<&BTreeSet<EntityType>>,
    observed: &BTreeSet<EntityType>,
    elapsed: Duration,
) -> SyncConvergenceResult {
    let (completed, pending) = match previous {
        Some(progress) => (progress.completed, progress.pending),
        None => (
            Vec::new(),
            relevant.map(|set| set.iter().cloned().collect()).unwrap_or_default(),
        ),
    };

    let never_observed: Vec<EntityType> = relevant
        .map(|set| set.difference(observed).cloned().collect())
        .unwrap_or_default();
    if !never_observed.is_empty() {
        warn!(
            types = ?never_observed,
            "entity types never appeared in any status snapshot; check the mapping table"
        );
    }

    SyncConvergenceResult {
        completed,
        pending,
        never_observed,
        outcome,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    struct FakeBackend {
        responses: Mutex<VecDeque<Result<Vec<FetchStatusEntry>>>>,
        fallback: Vec<FetchStatusEntry>,
        fail_trigger: bool,
    }

    impl FakeBackend {
        fn new(
            responses: Vec<Result<Vec<FetchStatusEntry>>>,
            fallback: Vec<FetchStatusEntry>,
        ) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                fallback,
                fail_trigger: false,
            }
        }
    }

    #[async_trait]
    impl SyncBackend for FakeBackend {
        async fn trigger_sync(&self) -> Result<()> {
            if self.fail_trigger {
                return Err(GuardError::Http("trigger refused".to_string()));
            }
            Ok(())
        }

        async fn fetch_status(&self) -> Result<Vec<FetchStatusEntry>> {
            match self.responses.lock().await.pop_front() {
                Some(response) => response,
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn entry(entity_type: &str, region: &str, run: Option<DateTime<Utc>>) -> FetchStatusEntry {
        FetchStatusEntry {
            entity_type: entity_type.into(),
            region: region.to_string(),
            last_successful_run: run,
        }
    }

    fn stale() -> Option<DateTime<Utc>> {
        Some(Utc::now() - ChronoDuration::hours(1))
    }

    fn fresh() -> Option<DateTime<Utc>> {
        Some(Utc::now() + ChronoDuration::hours(1))
    }

    fn types(names: &[&str]) -> BTreeSet<EntityType> {
        names.iter().map(|n| EntityType::from(*n)).collect()
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(30),
            ..PollConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn converges_once_snapshot_is_fresh() {
        let backend = FakeBackend::new(
            vec![Ok(vec![entry("SecurityGroup", "", stale())])],
            vec![entry("SecurityGroup", "", fresh())],
        );
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(600))
            .await;

        assert!(result.is_converged());
        assert_eq!(result.completed, vec![EntityType::from("SecurityGroup")]);
        assert!(result.pending.is_empty());
        // first poll was stale, so one 30s interval elapsed
        assert!(result.elapsed >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_pending_types() {
        let backend = FakeBackend::new(Vec::new(), vec![entry("SecurityGroup", "", stale())]);
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(60))
            .await;

        assert_eq!(result.outcome, ConvergenceOutcome::TimedOut);
        assert_eq!(result.pending, vec![EntityType::from("SecurityGroup")]);
        assert!(result.completed.is_empty());
        // never blocks past the budget plus one in-flight poll
        assert!(result.elapsed >= Duration::from_secs(60));
        assert!(result.elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_and_pending_partition_the_relevant_set() {
        let backend = FakeBackend::new(
            Vec::new(),
            vec![
                entry("SecurityGroup", "", fresh()),
                entry("Lambda", "", stale()),
            ],
        );
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup", "Lambda", "S3Bucket"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(60))
            .await;

        let mut union: BTreeSet<EntityType> = result.completed.iter().cloned().collect();
        assert!(result.pending.iter().all(|t| union.insert(t.clone())));
        assert_eq!(union, relevant);
        // S3Bucket was absent from every snapshot: pending, and reported
        assert!(result.pending.contains(&EntityType::from("S3Bucket")));
        assert_eq!(result.never_observed, vec![EntityType::from("S3Bucket")]);
    }

    #[tokio::test(start_paused = true)]
    async fn regression_returns_previous_result() {
        let backend = FakeBackend::new(
            vec![
                Ok(vec![
                    entry("SecurityGroup", "", fresh()),
                    entry("Lambda", "", stale()),
                ]),
                Ok(vec![
                    entry("SecurityGroup", "", stale()),
                    entry("Lambda", "", stale()),
                ]),
            ],
            Vec::new(),
        );
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup", "Lambda"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(600))
            .await;

        assert_eq!(result.outcome, ConvergenceOutcome::Regressed);
        // the result is the snapshot *before* the regression
        assert_eq!(result.completed, vec![EntityType::from("SecurityGroup")]);
        assert_eq!(result.pending, vec![EntityType::from("Lambda")]);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_is_transient() {
        let backend = FakeBackend::new(
            vec![Err(GuardError::Http("connection reset".to_string()))],
            vec![entry("SecurityGroup", "", fresh())],
        );
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(600))
            .await;

        assert!(result.is_converged());
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_failure_does_not_abort_polling() {
        let mut backend =
            FakeBackend::new(Vec::new(), vec![entry("SecurityGroup", "", fresh())]);
        backend.fail_trigger = true;
        let poller = SyncPoller::with_config(backend, fast_config());

        let relevant = types(&["SecurityGroup"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(600))
            .await;

        assert!(result.is_converged());
    }

    #[tokio::test(start_paused = true)]
    async fn region_filter_keeps_target_and_global_entries() {
        let backend = FakeBackend::new(
            Vec::new(),
            vec![
                entry("SecurityGroup", "us_east_1", fresh()),
                entry("Lambda", "eu_west_1", fresh()),
                entry("IamRole", "", fresh()),
            ],
        );
        let config = PollConfig {
            region: Some("us-east-1".to_string()),
            ..fast_config()
        };
        let poller = SyncPoller::with_config(backend, config);

        let relevant = types(&["SecurityGroup", "Lambda", "IamRole"]);
        let result = poller
            .wait_for_convergence(Some(&relevant), Duration::from_secs(60))
            .await;

        // Lambda's only row is in another region, so it can never complete
        assert_eq!(result.outcome, ConvergenceOutcome::TimedOut);
        assert!(result.pending.contains(&EntityType::from("Lambda")));
        assert!(result.completed.contains(&EntityType::from("SecurityGroup")));
        assert!(result.completed.contains(&EntityType::from("IamRole")));
    }

    #[tokio::test(start_paused = true)]
    async fn full_account_mode_waits_on_reported_types_minus_excluded() {
        let backend = FakeBackend::new(
            Vec::new(),
            vec![
                entry("SecurityGroup", "", fresh()),
                entry("LogGroups", "", stale()),
            ],
        );
        let config = PollConfig {
            excluded_types: types(&["LogGroups"]),
            ..fast_config()
        };
        let poller = SyncPoller::with_config(backend, config);

        let result = poller.wait_for_convergence(None, Duration::from_secs(60)).await;

        assert!(result.is_converged());
        assert_eq!(result.completed, vec![EntityType::from("SecurityGroup")]);
    }

    #[test]
    fn duplicate_rows_first_match_wins() {
        let relevant = types(&["SecurityGroup"]);
        let baseline = Utc::now();
        let snapshot = vec![
            entry("SecurityGroup", "", stale()),
            entry("SecurityGroup", "", fresh()),
        ];
        let (completed, pending) = classify(&relevant, &snapshot, baseline);
        assert!(completed.is_empty());
        assert_eq!(pending, vec![EntityType::from("SecurityGroup")]);
    }

    #[test]
    fn missing_timestamp_is_pending() {
        let relevant = types(&["SecurityGroup"]);
        let (completed, pending) =
            classify(&relevant, &[entry("SecurityGroup", "", None)], Utc::now());
        assert!(completed.is_empty());
        assert_eq!(pending.len(), 1);
    }
}
