use thiserror::Error;

/// Result type alias for stackguard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Errors that can occur when talking to the compliance backend
#[derive(Error, Debug)]
pub enum GuardError {
    /// Authentication failed - invalid or missing API credentials
    #[error("authentication failed: invalid API credentials")]
    Unauthorized,

    /// Resource not found
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// API returned an error response
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend accepted the request but the evaluation itself failed
    /// server-side. Distinct from transport failures so callers can tell
    /// "couldn't ask" from "asked, and it failed".
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Configuration error (bad mapping table, inconsistent inputs)
    #[error("configuration error: {0}")]
    Config(String),
}

impl GuardError {
    /// Returns true if the error is due to authentication
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns true if the failure happened before the backend could
    /// evaluate anything (transport-level), as opposed to a server-side
    /// evaluation failure.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::NotFound { .. } | Self::Api { .. } | Self::Http(_) | Self::Json(_)
        )
    }

    /// Returns the HTTP status code if this is an API error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
