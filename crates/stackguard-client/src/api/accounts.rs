//! Cloud-account API endpoints.

use crate::ComplianceClient;
use stackguard_core::{CloudAccount, CloudAccountRef, Result};
use tracing::debug;

/// Cloud-account API endpoints
pub struct AccountsApi<'a> {
    client: &'a ComplianceClient,
}

impl<'a> AccountsApi<'a> {
    pub(crate) fn new(client: &'a ComplianceClient) -> Self {
        Self { client }
    }

    /// Look up a cloud account by its provider-native account number
    pub async fn get(&self, account_number: &str) -> Result<CloudAccount> {
        self.client.get(&format!("/cloudaccounts/{account_number}")).await
    }

    /// Resolve an account reference to the backend's own account id.
    ///
    /// A [`CloudAccountRef::BackendId`] passes through without a request.
    pub async fn resolve(&self, account: &CloudAccountRef) -> Result<String> {
        match account {
            CloudAccountRef::BackendId(id) => Ok(id.clone()),
            CloudAccountRef::ProviderNumber(number) => {
                let resolved = self.get(number).await?;
                debug!(account = %number, backend_id = %resolved.id, "resolved backend account id");
                Ok(resolved.id)
            }
        }
    }
}
