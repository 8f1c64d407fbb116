//! Inventory refresh API endpoints.

use crate::ComplianceClient;
use stackguard_core::{FetchStatusEntry, Result, SyncNowAck};

/// Inventory refresh API endpoints
pub struct SyncApi<'a> {
    client: &'a ComplianceClient,
}

impl<'a> SyncApi<'a> {
    pub(crate) fn new(client: &'a ComplianceClient) -> Self {
        Self { client }
    }

    /// Ask the backend to refresh its inventory of the account now.
    ///
    /// Fire-and-forget with respect to convergence: completion is observed
    /// through [`Self::fetch_status`], not through this call.
    pub async fn trigger(&self, backend_account_id: &str) -> Result<SyncNowAck> {
        self.client
            .post_empty(&format!("/cloudaccounts/{backend_account_id}/SyncNow"))
            .await
    }

    /// Fetch the per-entity-type refresh status table for an account
    pub async fn fetch_status(&self, account_number: &str) -> Result<Vec<FetchStatusEntry>> {
        self.client
            .get_with_query("/EntityFetchStatus", &[("externalAccountNumber", account_number)])
            .await
    }
}
