//! Nonce-bound single-sign-on handshake.
//!
//! This crate is intentionally IO-free:
//! - No filesystem operations
//! - No network calls
//! - No environment reads outside [`AuthConfig::from_env`]
//!
//! Collaborators are injected via traits:
//! - [`nonce::EntropySource`] - Secure random bytes
//! - [`nonce::NonceGenerator`] - Nonce production
//! - [`challenge::AuthorizationDispatcher`] - The external authorization subsystem
//! - [`credential::Credential`] - Whatever credential type the subsystem returns
//!
//! # Example
//!
//! ```ignore
//! use ssobind_auth::{AuthConfig, Authenticator, SecureNonceGenerator};
//!
//! let authenticator = Authenticator::new(SecureNonceGenerator::new(), dispatcher, &AuthConfig::default());
//! let mut outcomes = authenticator.subscribe();
//!
//! authenticator.authenticate()?;
//! let event = outcomes.recv().await;
//! ```

pub mod challenge;
pub mod config;
pub mod credential;
pub mod handshake;
pub mod nonce;

pub use challenge::{AuthorizationDispatcher, AuthorizationRequest, ChallengeIssuer, Scope};
pub use config::{AuthConfig, ConfigError, NonceBinding};
pub use credential::{Credential, IdTokenClaims, IdentityCredential};
pub use handshake::{
    AttemptId, AuthenticationOutcome, Authenticator, AuthorizationError, AuthorizationErrorCode,
    CompletionError, CompletionHandle, CredentialError, IdentityToken, OutcomeChannel,
    OutcomeEvent, OutcomeSubscription, RejectReason, ResponseCorrelator,
};
pub use nonce::{Nonce, NonceError, NonceGenerator, SecureNonceGenerator};
