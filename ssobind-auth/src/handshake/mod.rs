//! Nonce-bound authentication handshake.
//!
//! The flow is:
//! 1. [`Authenticator`] generates a nonce and builds a request carrying its digest
//! 2. [`ResponseCorrelator::start_attempt`] records the raw nonce and returns a
//!    [`CompletionHandle`]
//! 3. The request and handle go to the external dispatcher together
//! 4. The dispatcher completes the handle with a credential or an error
//! 5. The correlator validates the credential against the raw nonce and
//!    publishes one terminal [`AuthenticationOutcome`]
//!
//! # Security
//!
//! - The raw nonce never leaves the process; only its digest is dispatched
//! - Nonce claims are compared in constant time
//! - Each attempt completes at most once; stale completions are dropped
//! - Pending attempts expire after a configurable time-to-live

mod attempt;
mod authenticator;
mod correlator;
mod error;
mod outcome;

pub use attempt::{AttemptId, AuthenticationAttempt};
pub use authenticator::Authenticator;
pub use correlator::{CompletionHandle, ResponseCorrelator};
pub use error::{AuthorizationError, AuthorizationErrorCode, CompletionError, CredentialError};
pub use outcome::{
    AuthenticationOutcome, IdentityToken, OutcomeChannel, OutcomeEvent, OutcomeSubscription,
    RejectReason, DEFAULT_CHANNEL_CAPACITY,
};
