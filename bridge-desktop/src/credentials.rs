//! Credential providers for native hosts

use async_trait::async_trait;
use bridge_traits::{
    auth::{Credential, CredentialProvider},
    error::Result,
};
use parking_lot::RwLock;

/// Holds a credential in memory.
///
/// The host swaps it on sign-in/sign-out with [`set`](Self::set) and
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct StaticCredentialProvider {
    credential: RwLock<Option<Credential>>,
}

impl StaticCredentialProvider {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            credential: RwLock::new(credential),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(Some(Credential::Bearer(token.into())))
    }

    pub fn session_cookie(cookie: impl Into<String>) -> Self {
        Self::new(Some(Credential::SessionCookie(cookie.into())))
    }

    pub fn set(&self, credential: Credential) {
        *self.credential.write() = Some(credential);
    }

    pub fn clear(&self) {
        *self.credential.write() = None;
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self) -> Result<Option<Credential>> {
        Ok(self.credential.read().clone())
    }
}

/// Reads a bearer token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    variable: String,
}

impl EnvCredentialProvider {
    pub const DEFAULT_VARIABLE: &'static str = "FISCAL_DASHBOARD_TOKEN";

    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VARIABLE)
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn credential(&self) -> Result<Option<Credential>> {
        Ok(std::env::var(&self.variable)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Credential::Bearer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_set_and_clear() {
        let provider = StaticCredentialProvider::default();
        assert_eq!(provider.credential().await.unwrap(), None);

        provider.set(Credential::Bearer("abc".to_string()));
        assert_eq!(
            provider.credential().await.unwrap(),
            Some(Credential::Bearer("abc".to_string()))
        );

        provider.clear();
        assert_eq!(provider.credential().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_env_provider_missing_variable() {
        let provider = EnvCredentialProvider::new("FISCAL_DASHBOARD_TEST_UNSET_VARIABLE");
        assert_eq!(provider.credential().await.unwrap(), None);
    }
}
