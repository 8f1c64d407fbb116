//! Rule-bundle assessment execution.

use stackguard_client::ComplianceClient;
use stackguard_core::{AssessmentResult, CloudAccountRef, Result};
use tracing::info;

/// Executes a rule bundle against an account's current inventory.
///
/// Should only run after the inventory has converged; the runner itself does
/// not wait. Each call is a fresh execution and is never retried here.
pub struct AssessmentRunner<'a> {
    client: &'a ComplianceClient,
}

impl<'a> AssessmentRunner<'a> {
    /// Create a runner over the given client
    #[must_use]
    pub const fn new(client: &'a ComplianceClient) -> Self {
        Self { client }
    }

    /// Execute the bundle and return the raw result set
    pub async fn run(
        &self,
        bundle_id: i64,
        account: &CloudAccountRef,
        region: Option<&str>,
    ) -> Result<AssessmentResult> {
        let backend_id = self.client.accounts().resolve(account).await?;

        info!(bundle = bundle_id, account = %account, "starting assessment execution");
        let result = self
            .client
            .assessment()
            .run_bundle(bundle_id, &backend_id, region)
            .await?;
        info!(
            assessment = ?result.id,
            bundle_name = result.request.name.as_deref().unwrap_or("?"),
            tests = result.tests.len(),
            "assessment execution done"
        );

        Ok(result)
    }
}
