//! Credential Abstraction
//!
//! The host owns sign-in and session refresh; the core only asks for the
//! credential to attach to the next request.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Credential attached to every API request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// Raw `Cookie` header value for cookie-based sessions
    SessionCookie(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secrets.
        match self {
            Credential::Bearer(_) => f.write_str("Credential::Bearer(***)"),
            Credential::SessionCookie(_) => f.write_str("Credential::SessionCookie(***)"),
        }
    }
}

/// Supplies the current credential.
///
/// Returning `Ok(None)` means the user is not signed in. The core treats
/// that as an unrecoverable precondition for the request at hand: it is
/// surfaced as an error state and never retried internally.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::auth::{Credential, CredentialProvider};
///
/// struct SessionStore { token: Option<String> }
///
/// #[async_trait::async_trait]
/// impl CredentialProvider for SessionStore {
///     async fn credential(&self) -> Result<Option<Credential>> {
///         Ok(self.token.clone().map(Credential::Bearer))
///     }
/// }
/// ```
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current credential, or `None` when no session is active
    async fn credential(&self) -> Result<Option<Credential>>;
}
