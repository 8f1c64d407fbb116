use serde::{Deserialize, Serialize};

/// A cloud account as the compliance backend knows it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccount {
    /// The backend's own account identifier
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// The provider-side account number this maps to
    #[serde(default)]
    pub external_account_number: Option<String>,

    /// Cloud vendor label (e.g. `aws`)
    #[serde(default)]
    pub vendor: Option<String>,
}

/// Reference to a cloud account, either by the provider's account number
/// (resolved through the backend before use) or by the backend's own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudAccountRef {
    /// Provider-native account number (e.g. an AWS account number)
    ProviderNumber(String),
    /// The backend's account id, no resolution needed
    BackendId(String),
}

impl CloudAccountRef {
    /// The provider account number, when that is how the account is referenced
    #[must_use]
    pub fn provider_number(&self) -> Option<&str> {
        match self {
            Self::ProviderNumber(n) => Some(n),
            Self::BackendId(_) => None,
        }
    }
}

impl std::fmt::Display for CloudAccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderNumber(n) => write!(f, "account number {n}"),
            Self::BackendId(id) => write!(f, "backend account {id}"),
        }
    }
}
