//! Rule-bundle execution API endpoints.

use crate::ComplianceClient;
use serde::Serialize;
use stackguard_core::{backend_region, AssessmentResult, GuardError, Result};
use tracing::debug;

/// Request body for a bundle execution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleExecutionRequest {
    /// Server-stored bundle id to execute
    pub id: i64,

    /// The backend's cloud account id
    pub cloud_account_id: String,

    /// Backend region spelling; omitted for account-wide execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Cloud vendor discriminator
    pub cloud_account_type: &'static str,
}

/// Rule-bundle execution API endpoints
pub struct AssessmentApi<'a> {
    client: &'a ComplianceClient,
}

impl<'a> AssessmentApi<'a> {
    pub(crate) fn new(client: &'a ComplianceClient) -> Self {
        Self { client }
    }

    /// Execute a rule bundle against an account's current inventory.
    ///
    /// Each call is a fresh execution; there are no internal retries. A
    /// well-formed response that carries an embedded server-side failure is
    /// surfaced as [`GuardError::Evaluation`], distinct from transport
    /// failures.
    pub async fn run_bundle(
        &self,
        bundle_id: i64,
        backend_account_id: &str,
        region: Option<&str>,
    ) -> Result<AssessmentResult> {
        let body = BundleExecutionRequest {
            id: bundle_id,
            cloud_account_id: backend_account_id.to_string(),
            region: region.map(backend_region),
            cloud_account_type: "Aws",
        };

        debug!(bundle = bundle_id, account = %backend_account_id, "executing bundle");
        let result: AssessmentResult = self.client.post("/assessment/bundleV2", &body).await?;

        if let Some(message) = result.evaluation_error() {
            return Err(GuardError::Evaluation(message.to_string()));
        }

        Ok(result)
    }
}
