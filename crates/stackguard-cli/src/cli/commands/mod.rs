//! Command implementations.

pub mod assess;
pub mod config;
pub mod gate;
pub mod sync;

use crate::cli::args::ScopeArgs;
use crate::output::OutputFormat;
use anyhow::Result;
use stackguard::{CloudAccountRef, ComplianceClient, Credentials, Severity};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// API key id
    pub key_id: Option<String>,

    /// API secret
    pub secret: Option<String>,

    /// Backend API base URL override
    pub api_url: Option<String>,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    /// Get the credential pair, returning an error if not set.
    pub fn require_credentials(&self) -> Result<Credentials> {
        match (&self.key_id, &self.secret) {
            (Some(key_id), Some(secret)) => Ok(Credentials::new(key_id, secret)),
            _ => anyhow::bail!(
                "API credentials required.\n\n\
                 Set them with one of:\n  \
                 1. --key-id <ID> --secret <SECRET>\n  \
                 2. STACKGUARD_KEY_ID / STACKGUARD_SECRET environment variables\n  \
                 3. stackguard config set key_id <ID>"
            ),
        }
    }

    /// Create a backend client with the configured credentials.
    pub fn client(&self) -> Result<ComplianceClient> {
        let credentials = self.require_credentials()?;
        let mut builder = ComplianceClient::builder(credentials);
        if let Some(url) = &self.api_url {
            builder = builder.base_url(url.clone());
        }
        Ok(builder.build())
    }
}

/// Pick the account reference out of the scope arguments.
///
/// The backend id wins when both are given; fetch-status polling still
/// requires the provider account number.
pub fn account_ref(scope: &ScopeArgs) -> Result<CloudAccountRef> {
    if let Some(number) = &scope.account_number {
        return Ok(CloudAccountRef::ProviderNumber(number.clone()));
    }
    if let Some(id) = &scope.backend_account_id {
        return Ok(CloudAccountRef::BackendId(id.clone()));
    }
    anyhow::bail!("either --account-number or --backend-account-id is required")
}

/// Parse a severity argument, rejecting anything the backend never reports.
pub fn parse_min_severity(value: &str) -> Result<Severity> {
    match value.parse::<Severity>() {
        Ok(Severity::Unknown) | Err(_) => anyhow::bail!(
            "unknown severity: {value} (expected High, Medium or Low)"
        ),
        Ok(severity) => Ok(severity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_severity_rejects_typos() {
        assert!(parse_min_severity("High").is_ok());
        assert!(parse_min_severity("medium").is_ok());
        assert!(parse_min_severity("hgih").is_err());
    }
}
