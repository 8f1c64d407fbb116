//! End-to-end gate orchestration.
//!
//! Wires the pieces in pipeline order: map the stack's resource types, wait
//! for inventory convergence, run the bundle, correlate the failures, score
//! the risk. Stack-scoped and full-account runs share one implementation;
//! the difference is whether a stack inventory restricts the wait and the
//! correlation.

use crate::correlate::analyze;
use crate::inventory::{StackResourceInventory, StackResourceProvider};
use crate::mapping::ResourceTypeMapper;
use crate::poller::{AccountSyncBackend, PollConfig, SyncPoller, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
use crate::risk::RiskPolicy;
use crate::runner::AssessmentRunner;
use serde::{Deserialize, Serialize};
use stackguard_client::ComplianceClient;
use stackguard_core::{
    CloudAccountRef, ConvergenceOutcome, EntityType, FailedTest, Result, SyncConvergenceResult,
};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

/// Gate run configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Server-stored rule bundle to execute
    pub bundle_id: i64,

    /// Provider region the stack lives in; `None` runs account-wide
    pub region: Option<String>,

    /// Entity types never waited on during convergence
    pub excluded_types: BTreeSet<EntityType>,

    /// Wall-clock budget for the convergence wait
    pub max_sync_wait: Duration,

    /// Pause between convergence polls
    pub poll_interval: Duration,

    /// Risk scoring policy
    pub risk_policy: RiskPolicy,

    /// Run the assessment even when the wait timed out. Off by default:
    /// assessing a stale inventory produces findings nobody can trust.
    /// A regressed wait never assesses regardless of this flag.
    pub assess_on_timeout: bool,
}

impl GateConfig {
    /// Default configuration for the given bundle
    #[must_use]
    pub fn new(bundle_id: i64) -> Self {
        Self {
            bundle_id,
            region: None,
            excluded_types: BTreeSet::new(),
            max_sync_wait: DEFAULT_MAX_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            risk_policy: RiskPolicy::default(),
            assess_on_timeout: false,
        }
    }
}

/// Everything one gate run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    /// How the convergence wait ended
    pub convergence: SyncConvergenceResult,

    /// Stack resource types the mapping table has no equivalent for
    pub unsupported_types: Vec<String>,

    /// Correlated failures; empty when the assessment did not run
    pub failed_tests: Vec<FailedTest>,

    /// Risk score under the configured policy
    pub risk: u8,

    /// Whether the assessment actually executed
    pub assessment_ran: bool,
}

/// One parameterized compliance gate
pub struct ComplianceGate<'a> {
    client: &'a ComplianceClient,
    mapper: &'a ResourceTypeMapper,
    config: GateConfig,
}

impl<'a> ComplianceGate<'a> {
    /// Create a gate over the given client and mapping table
    #[must_use]
    pub const fn new(
        client: &'a ComplianceClient,
        mapper: &'a ResourceTypeMapper,
        config: GateConfig,
    ) -> Self {
        Self {
            client,
            mapper,
            config,
        }
    }

    /// Run the gate restricted to one deployed stack.
    ///
    /// The wait covers only entity types the stack's resources map to, and
    /// failures are correlated back to the stack's physical ids.
    pub async fn run_stack_scoped(
        &self,
        account: &CloudAccountRef,
        stack_name: &str,
        provider: &dyn StackResourceProvider,
    ) -> Result<GateReport> {
        let resources = provider.list_physical_resources(stack_name).await?;
        let native_types: BTreeSet<&str> =
            resources.iter().map(|r| r.resource_type.as_str()).collect();

        let (supported, unsupported) = self.mapper.partition(native_types.iter().copied());
        info!(
            stack = stack_name,
            supported = supported.len(),
            unsupported = unsupported.len(),
            "mapped stack resource types"
        );

        let relevant = self
            .mapper
            .relevant_entity_types(native_types.iter().copied(), &self.config.excluded_types);
        let inventory = StackResourceInventory::from_resources(self.mapper, stack_name, &resources);

        let convergence = self.wait(account, Some(&relevant)).await;
        self.assess_if_ready(
            account,
            convergence,
            Some(&inventory),
            unsupported.into_iter().map(String::from).collect(),
        )
        .await
    }

    /// Run the gate over the whole account
    pub async fn run_account(&self, account: &CloudAccountRef) -> Result<GateReport> {
        let convergence = self.wait(account, None).await;
        self.assess_if_ready(account, convergence, None, Vec::new()).await
    }

    async fn wait(
        &self,
        account: &CloudAccountRef,
        relevant: Option<&BTreeSet<EntityType>>,
    ) -> SyncConvergenceResult {
        let backend = AccountSyncBackend::new(self.client, account.clone());
        let poller = SyncPoller::with_config(
            backend,
            PollConfig {
                interval: self.config.poll_interval,
                region: self.config.region.clone(),
                excluded_types: self.config.excluded_types.clone(),
            },
        );
        poller
            .wait_for_convergence(relevant, self.config.max_sync_wait)
            .await
    }

    async fn assess_if_ready(
        &self,
        account: &CloudAccountRef,
        convergence: SyncConvergenceResult,
        inventory: Option<&StackResourceInventory>,
        unsupported_types: Vec<String>,
    ) -> Result<GateReport> {
        let proceed = match convergence.outcome {
            ConvergenceOutcome::Converged => true,
            ConvergenceOutcome::TimedOut => self.config.assess_on_timeout,
            // an unstable backend invalidates whatever it would report
            ConvergenceOutcome::Regressed => false,
        };

        if !proceed {
            warn!(outcome = %convergence.outcome, "skipping assessment; inventory did not converge");
            return Ok(GateReport {
                convergence,
                unsupported_types,
                failed_tests: Vec::new(),
                risk: 0,
                assessment_ran: false,
            });
        }

        let runner = AssessmentRunner::new(self.client);
        let result = runner
            .run(self.config.bundle_id, account, self.config.region.as_deref())
            .await?;

        let failed_tests = analyze(&result, inventory);
        let risk = self.config.risk_policy.score(&failed_tests);
        info!(failed = failed_tests.len(), risk, "assessment analyzed");

        Ok(GateReport {
            convergence,
            unsupported_types,
            failed_tests,
            risk,
            assessment_ran: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StackResource;
    use async_trait::async_trait;
    use stackguard_client::Credentials;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedProvider(Vec<StackResource>);

    #[async_trait]
    impl StackResourceProvider for FixedProvider {
        async fn list_physical_resources(&self, _stack_name: &str) -> Result<Vec<StackResource>> {
            Ok(self.0.clone())
        }
    }

    fn fresh_status_body() -> String {
        let run = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        format!(r#"[{{"entityType":"SecurityGroup","region":"us_east_1","lastSuccessfulRun":"{run}"}}]"#)
    }

    async fn mount_backend(server: &MockServer, assessment_body: &str) {
        Mock::given(method("GET"))
            .and(path("/cloudaccounts/123456789012"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"id": "d9-abc", "externalAccountNumber": "123456789012"}"#,
                "application/json",
            ))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloudaccounts/d9-abc/SyncNow"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r"{}", "application/json"))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/EntityFetchStatus"))
            .and(query_param("externalAccountNumber", "123456789012"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(fresh_status_body(), "application/json"),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/assessment/bundleV2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(assessment_body.to_string(), "application/json"),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn stack_scoped_gate_runs_end_to_end() {
        let server = MockServer::start().await;
        mount_backend(
            &server,
            r#"{
                "id": 11,
                "request": {"name": "baseline"},
                "tests": [{
                    "rule": {"name": "No open SSH", "severity": "High", "description": "d"},
                    "testPassed": false,
                    "entityResults": [
                        {"isRelevant": true, "isValid": false, "testObj": {"entityType": "SecurityGroup", "entityIndex": 0}}
                    ]
                }],
                "testEntities": {"SecurityGroup": [{"id": "sg-123"}]}
            }"#,
        )
        .await;

        let client = ComplianceClient::builder(Credentials::new("key", "secret"))
            .base_url(server.uri())
            .build();
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let mut config = GateConfig::new(-15);
        config.region = Some("us-east-1".to_string());
        config.max_sync_wait = Duration::from_secs(5);
        config.poll_interval = Duration::from_millis(10);
        let gate = ComplianceGate::new(&client, &mapper, config);

        let provider = FixedProvider(vec![
            StackResource {
                resource_type: "AWS::EC2::SecurityGroup".to_string(),
                physical_id: "sg-123".to_string(),
            },
            StackResource {
                resource_type: "AWS::Logs::LogGroup".to_string(),
                physical_id: "/aws/lambda/foo".to_string(),
            },
        ]);
        let account = CloudAccountRef::ProviderNumber("123456789012".to_string());

        let report = gate
            .run_stack_scoped(&account, "web-stack", &provider)
            .await
            .unwrap();

        assert!(report.convergence.is_converged());
        assert!(report.assessment_ran);
        assert_eq!(report.unsupported_types, vec!["AWS::Logs::LogGroup".to_string()]);
        assert_eq!(report.failed_tests.len(), 1);
        assert_eq!(report.risk, 100);
    }

    #[tokio::test]
    async fn gate_skips_assessment_when_wait_times_out() {
        let server = MockServer::start().await;
        // status table never mentions SecurityGroup, so the wait starves
        Mock::given(method("GET"))
            .and(path("/cloudaccounts/123456789012"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"id": "d9-abc"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cloudaccounts/d9-abc/SyncNow"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r"{}", "application/json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/EntityFetchStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let client = ComplianceClient::builder(Credentials::new("key", "secret"))
            .base_url(server.uri())
            .build();
        let mapper = ResourceTypeMapper::embedded().unwrap();
        let mut config = GateConfig::new(7);
        config.max_sync_wait = Duration::from_millis(50);
        config.poll_interval = Duration::from_millis(10);
        let gate = ComplianceGate::new(&client, &mapper, config);

        let provider = FixedProvider(vec![StackResource {
            resource_type: "AWS::EC2::SecurityGroup".to_string(),
            physical_id: "sg-123".to_string(),
        }]);
        let account = CloudAccountRef::ProviderNumber("123456789012".to_string());

        let report = gate
            .run_stack_scoped(&account, "web-stack", &provider)
            .await
            .unwrap();

        assert_eq!(report.convergence.outcome, ConvergenceOutcome::TimedOut);
        assert!(!report.assessment_ran);
        assert!(report.failed_tests.is_empty());
        assert_eq!(report.risk, 0);
        assert_eq!(
            report.convergence.never_observed,
            vec![stackguard_core::EntityType::from("SecurityGroup")]
        );
    }
}
