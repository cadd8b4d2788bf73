//! Credential management for Discogs API authentication.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the personal access token.
pub const TOKEN_ENV_VAR: &str = "DISCOGS_TOKEN";

/// A personal access token plus the user agent sent with every request.
#[derive(Clone)]
pub struct Credentials {
    token: SecretString,
    /// Custom user agent, replacing the crate default
    pub user_agent: Option<String>,
}

impl Credentials {
    /// Create credentials from a personal access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user_agent: None,
        }
    }

    /// Attach a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Try to read the token from `DISCOGS_TOKEN`.
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_var(TOKEN_ENV_VAR)
    }

    /// Try to read the token from a custom environment variable.
    pub fn try_from_env_var(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(Self::new)
    }

    /// Get the token.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Value of the `Authorization` header for this token.
    pub(crate) fn authorization(&self) -> String {
        format!("Discogs token={}", self.token.expose_secret())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
