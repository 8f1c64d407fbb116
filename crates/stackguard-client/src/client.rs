//! Main compliance backend client implementation.

use crate::api::{AccountsApi, AssessmentApi, SyncApi};
use crate::config::Credentials;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use stackguard_core::{GuardError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The compliance backend API base URL
const DEFAULT_BASE_URL: &str = "https://api.dome9.com/v2";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Main compliance backend API client
#[derive(Clone)]
pub struct ComplianceClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    credentials: Credentials,
    base_url: String,
}

impl ComplianceClient {
    /// Create a new client with the given credentials using default settings
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        ComplianceClientBuilder::new(credentials).build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder(credentials: Credentials) -> ComplianceClientBuilder {
        ComplianceClientBuilder::new(credentials)
    }

    /// Access cloud-account endpoints
    #[must_use]
    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi::new(self)
    }

    /// Access inventory refresh endpoints
    #[must_use]
    pub fn sync(&self) -> SyncApi<'_> {
        SyncApi::new(self)
    }

    /// Access rule-bundle execution endpoints
    #[must_use]
    pub fn assessment(&self) -> AssessmentApi<'_> {
        AssessmentApi::new(self)
    }

    /// Perform a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_query(path, &[]).await
    }

    /// Perform a GET request with query parameters
    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.build_url(path, params);
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(&url)
            .basic_auth(self.inner.credentials.key_id(), Some(self.inner.credentials.secret()))
            .send()
            .await
            .map_err(|e| GuardError::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Perform a POST request with JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path, &[]);
        debug!(url = %url, "POST request");

        let response = self
            .inner
            .http
            .post(&url)
            .basic_auth(self.inner.credentials.key_id(), Some(self.inner.credentials.secret()))
            .json(body)
            .send()
            .await
            .map_err(|e| GuardError::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Perform a POST request with no body
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path, &[]);
        debug!(url = %url, "POST request");

        let response = self
            .inner
            .http
            .post(&url)
            .basic_auth(self.inner.credentials.key_id(), Some(self.inner.credentials.secret()))
            .send()
            .await
            .map_err(|e| GuardError::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Build a URL with query parameters
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.inner.base_url, path);

        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url
    }

    /// Handle an API response that returns JSON
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(|e| GuardError::Http(e.to_string()))?;
            serde_json::from_str(&body).map_err(GuardError::Json)
        } else {
            Self::handle_error(status.as_u16(), response).await
        }
    }

    /// Convert an error response to a GuardError
    async fn handle_error<T>(status: u16, response: reqwest::Response) -> Result<T> {
        let body = response.text().await.unwrap_or_default();

        // Try to parse an error message out of the JSON body
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .or_else(|| v.get("error"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);

        match status {
            401 | 403 => Err(GuardError::Unauthorized),
            404 => Err(GuardError::NotFound { resource: message }),
            _ => Err(GuardError::Api {
                code: status,
                message,
            }),
        }
    }
}

/// Builder for configuring a [`ComplianceClient`]
pub struct ComplianceClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl ComplianceClientBuilder {
    /// Create a new builder with the given credentials
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("stackguard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> ComplianceClient {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        ComplianceClient {
            inner: Arc::new(ClientInner {
                http,
                credentials: self.credentials,
                base_url: self.base_url,
            }),
        }
    }
}

// URL encoding helper
mod urlencoding {
    pub fn encode(s: &str) -> String {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
    }
}
