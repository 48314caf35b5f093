//! Challenge issuing.
//!
//! The issuer turns a nonce digest into an [`AuthorizationRequest`]. Sending
//! it is the job of an external [`AuthorizationDispatcher`], which reports the
//! result later through the [`CompletionHandle`] it was given.

mod request;

pub use request::{AuthorizationRequest, Scope, DEFAULT_SCOPES};

use crate::handshake::CompletionHandle;

/// External authorization subsystem.
///
/// # Contract
///
/// - `perform` receives the request batch and its completion delegate in the
///   same call, so no completion can arrive before the delegate is known.
/// - Dispatch is fire-and-forget: the result arrives later through exactly
///   one of `CompletionHandle::complete_with_authorization` or
///   `CompletionHandle::complete_with_error`.
pub trait AuthorizationDispatcher: Send + Sync {
    /// Dispatch a batch of requests and register `delegate` for its completion.
    fn perform(&self, requests: Vec<AuthorizationRequest>, delegate: CompletionHandle);
}

/// Builds authorization requests that embed a nonce digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeIssuer {
    scopes: Vec<Scope>,
}

impl ChallengeIssuer {
    /// Create an issuer requesting custom scopes.
    #[must_use]
    pub fn with_scopes(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            scopes: scopes.into_iter().collect(),
        }
    }

    /// The scopes this issuer requests.
    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Build a request carrying `digest` as its nonce.
    #[must_use]
    pub fn build_request(&self, digest: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            scopes: self.scopes.clone(),
            nonce: digest.to_string(),
        }
    }
}

impl Default for ChallengeIssuer {
    fn default() -> Self {
        Self::with_scopes(DEFAULT_SCOPES)
    }
}
