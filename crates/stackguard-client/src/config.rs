//! Client credential configuration.

/// API credential pair for the compliance backend.
///
/// Sent as HTTP basic auth on every request. The `Debug` impl redacts the
/// secret so the pair can safely cross logging boundaries.
#[derive(Clone)]
pub struct Credentials {
    key_id: String,
    secret: String,
}

impl Credentials {
    /// Create a new credential pair
    #[must_use]
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }

    /// The key id (basic-auth username)
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The secret (basic-auth password)
    #[must_use]
    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
