//! Credential providers for authenticating a session.
//!
//! The lobby client authenticates once, right after connecting, by
//! presenting the server's administrator secret. Where that secret comes
//! from is the application's business: a config file, an environment
//! variable, a prompt. The [`CredentialProvider`] trait is that seam.

use std::future::Future;

use crate::SessionError;

/// Default environment variable read by [`EnvCredential`].
pub const DEFAULT_PASSWORD_VAR: &str = "LOBBY_PASSWORD";

/// Supplies the secret presented to the server.
///
/// # Example
///
/// ```rust
/// use lobbyist_session::{CredentialProvider, SessionError};
///
/// /// Reads the secret from a file next to the binary.
/// struct FileCredential(std::path::PathBuf);
///
/// impl CredentialProvider for FileCredential {
///     async fn secret(&self) -> Result<String, SessionError> {
///         std::fs::read_to_string(&self.0)
///             .map(|s| s.trim().to_string())
///             .map_err(|e| SessionError::MissingCredential(e.to_string()))
///     }
/// }
/// ```
pub trait CredentialProvider: Send + Sync + 'static {
    /// Returns the secret to authenticate with.
    ///
    /// # Errors
    /// Returns [`SessionError::MissingCredential`] if no secret is available.
    fn secret(
        &self,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// A fixed secret known at startup.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub String);

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl CredentialProvider for StaticCredential {
    async fn secret(&self) -> Result<String, SessionError> {
        Ok(self.0.clone())
    }
}

/// Reads the secret from an environment variable at authentication time.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    /// Reads from the given variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// The variable this provider reads.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD_VAR)
    }
}

impl CredentialProvider for EnvCredential {
    async fn secret(&self) -> Result<String, SessionError> {
        std::env::var(&self.var).map_err(|e| {
            SessionError::MissingCredential(format!("{}: {e}", self.var))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_returns_secret() {
        let cred = StaticCredential::new("hunter2");
        assert_eq!(cred.secret().await.unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn test_env_credential_missing_variable() {
        let cred = EnvCredential::new("LOBBYIST_TEST_SURELY_UNSET_VAR");
        let err = cred.secret().await.unwrap_err();
        assert!(matches!(err, SessionError::MissingCredential(_)));
        assert!(err.to_string().contains("LOBBYIST_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_env_credential_default_var() {
        assert_eq!(EnvCredential::default().var(), DEFAULT_PASSWORD_VAR);
    }
}
