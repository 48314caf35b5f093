//! Response correlation.
//!
//! The correlator holds at most one pending attempt. A completion takes the
//! attempt out of the state under the lock, validates against it and
//! publishes exactly one terminal outcome, leaving the correlator idle.
//!
//! Completions arrive either through a [`CompletionHandle`] bound to one
//! attempt, or through the unbound [`ResponseCorrelator::on_success`] /
//! [`ResponseCorrelator::on_failure`] entry points which act on whatever
//! attempt is pending.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{AuthConfig, NonceBinding};
use crate::credential::Credential;

use super::attempt::{AttemptId, AuthenticationAttempt};
use super::error::{CompletionError, CredentialError};
use super::outcome::{
    AuthenticationOutcome, IdentityToken, OutcomeChannel, OutcomeEvent, OutcomeSubscription,
    RejectReason,
};

#[derive(Debug, Default)]
struct CorrelatorState {
    pending: Option<AuthenticationAttempt>,
    last_id: u64,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<CorrelatorState>,
    channel: OutcomeChannel,
    binding: NonceBinding,
    attempt_ttl: chrono::Duration,
}

/// Which attempt a completion is meant for.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// Whatever is pending right now.
    Current,
    /// One specific attempt; ignored if it is no longer pending.
    Attempt(AttemptId),
}

/// Authentication controller: matches completions against the pending
/// attempt and publishes terminal outcomes.
///
/// Cheap to clone; clones share state and channel.
#[derive(Debug, Clone)]
pub struct ResponseCorrelator {
    inner: Arc<Inner>,
}

impl ResponseCorrelator {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CorrelatorState::default()),
                channel: OutcomeChannel::new(config.channel_capacity),
                binding: config.nonce_binding,
                attempt_ttl: config.attempt_ttl(),
            }),
        }
    }

    /// Subscribe to outcomes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> OutcomeSubscription {
        self.inner.channel.subscribe()
    }

    /// The underlying outcome channel.
    #[must_use]
    pub fn channel(&self) -> &OutcomeChannel {
        &self.inner.channel
    }

    /// The nonce binding this correlator enforces.
    #[must_use]
    pub fn binding(&self) -> NonceBinding {
        self.inner.binding
    }

    /// The attempt currently pending, if any.
    #[must_use]
    pub fn pending_attempt(&self) -> Option<AttemptId> {
        self.inner.lock().pending.as_ref().map(AuthenticationAttempt::id)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending_attempt().is_some()
    }

    /// Start a new attempt holding `raw_nonce`.
    ///
    /// If another attempt is still pending it is cancelled first, and its
    /// subscribers see `Rejected(Cancelled)`.
    ///
    /// The returned handle is the completion delegate for this attempt only.
    pub fn start_attempt(&self, raw_nonce: &str) -> CompletionHandle {
        let mut state = self.inner.lock();
        state.last_id += 1;
        let id = AttemptId::new(state.last_id);

        if let Some(prior) = state.pending.take() {
            tracing::warn!(attempt = %prior.id(), superseded_by = %id, "pending attempt superseded");
            self.inner.publish(
                Some(prior.id()),
                AuthenticationOutcome::Rejected(RejectReason::Cancelled),
            );
        }

        state.pending = Some(AuthenticationAttempt::new(id, raw_nonce, self.inner.attempt_ttl));
        tracing::info!(attempt = %id, "authentication attempt started");

        CompletionHandle {
            inner: Arc::clone(&self.inner),
            attempt: id,
        }
    }

    /// Cancel the pending attempt, if any.
    ///
    /// Returns the cancelled attempt. Its subscribers see `Rejected(Cancelled)`.
    pub fn cancel(&self) -> Option<AttemptId> {
        let mut state = self.inner.lock();
        let attempt = state.pending.take()?;
        tracing::info!(attempt = %attempt.id(), "authentication attempt cancelled");
        self.inner.publish(
            Some(attempt.id()),
            AuthenticationOutcome::Rejected(RejectReason::Cancelled),
        );
        Some(attempt.id())
    }

    /// Deliver a credential for the pending attempt.
    ///
    /// With no attempt pending this publishes
    /// `Rejected(InvalidCredential(NoPendingAttempt))` (or an earlier
    /// validation failure).
    pub fn on_success<C: Credential + ?Sized>(&self, credential: &C) {
        self.inner.complete_success(Target::Current, credential);
    }

    /// Deliver an authorization failure for the pending attempt.
    ///
    /// Always publishes `Rejected(UnderlyingFailure)`, pending or not.
    pub fn on_failure(&self, error: CompletionError) {
        self.inner.complete_failure(Target::Current, error);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CorrelatorState> {
        // The state is plain data and every transition is a single take or
        // assignment, so a poisoned lock still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, attempt: Option<AttemptId>, outcome: AuthenticationOutcome) {
        self.channel.publish(OutcomeEvent { attempt, outcome });
    }

    /// Take the attempt a completion is meant for.
    ///
    /// `Err(())` means the completion is stale and must be dropped.
    fn take_target(
        state: &mut CorrelatorState,
        target: Target,
    ) -> Result<Option<AuthenticationAttempt>, ()> {
        match target {
            Target::Current => Ok(state.pending.take()),
            Target::Attempt(id) => {
                if state.pending.as_ref().map(AuthenticationAttempt::id) == Some(id) {
                    Ok(state.pending.take())
                } else {
                    Err(())
                }
            }
        }
    }

    fn complete_success<C: Credential + ?Sized>(&self, target: Target, credential: &C) {
        // Credential methods are foreign code; call them before locking.
        let token = credential.identity_token();
        let claim = credential.nonce_claim();

        let mut state = self.lock();
        let Ok(attempt) = Self::take_target(&mut state, target) else {
            tracing::warn!(?target, "completion for an attempt that is no longer pending dropped");
            return;
        };

        let attempt_id = attempt.as_ref().map(AuthenticationAttempt::id);
        let outcome = match validate(token, claim, attempt.as_ref(), self.binding) {
            Ok(token) => {
                tracing::info!(attempt = ?attempt_id, "authentication succeeded");
                AuthenticationOutcome::Authenticated(token)
            }
            Err(reason) => {
                tracing::warn!(attempt = ?attempt_id, %reason, "credential rejected");
                AuthenticationOutcome::Rejected(RejectReason::InvalidCredential(reason))
            }
        };

        self.publish(attempt_id, outcome);
    }

    fn complete_failure(&self, target: Target, error: CompletionError) {
        let mut state = self.lock();
        let Ok(attempt) = Self::take_target(&mut state, target) else {
            tracing::warn!(?target, "completion for an attempt that is no longer pending dropped");
            return;
        };

        let attempt_id = attempt.as_ref().map(AuthenticationAttempt::id);
        if !error.is_recognized() {
            tracing::warn!(attempt = ?attempt_id, %error, "unrecognized completion error");
        }
        let error = error.into_authorization_error();
        tracing::info!(attempt = ?attempt_id, code = %error.code, "authorization failed");

        self.publish(
            attempt_id,
            AuthenticationOutcome::Rejected(RejectReason::UnderlyingFailure(error)),
        );
    }
}

/// Validate a credential against an attempt, in order: token present and
/// non-empty, token is UTF-8, attempt exists, attempt not expired, nonce
/// claim present, nonce claim bound to the attempt's nonce.
fn validate(
    token: Option<&[u8]>,
    claim: Option<String>,
    attempt: Option<&AuthenticationAttempt>,
    binding: NonceBinding,
) -> Result<IdentityToken, CredentialError> {
    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(CredentialError::MissingIdentityToken)?;
    let token = std::str::from_utf8(token).map_err(|_| CredentialError::TokenNotUtf8)?;

    let attempt = attempt.ok_or(CredentialError::NoPendingAttempt)?;
    if attempt.is_expired() {
        return Err(CredentialError::AttemptExpired);
    }

    let claim = claim.ok_or(CredentialError::MissingNonceClaim)?;
    if !attempt.nonce_matches(&claim, binding) {
        return Err(CredentialError::NonceMismatch);
    }

    Ok(IdentityToken::from(token))
}

/// Completion delegate for one attempt.
///
/// Handed to the authorization dispatcher together with the request batch.
/// Only the first completion for its attempt is honored; later ones, or
/// ones arriving after the attempt was cancelled or superseded, are dropped.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    inner: Arc<Inner>,
    attempt: AttemptId,
}

impl CompletionHandle {
    /// The attempt this handle completes.
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Report a successful authorization carrying `credential`.
    pub fn complete_with_authorization<C: Credential + ?Sized>(&self, credential: &C) {
        self.inner
            .complete_success(Target::Attempt(self.attempt), credential);
    }

    /// Report that the authorization failed.
    pub fn complete_with_error(&self, error: CompletionError) {
        self.inner
            .complete_failure(Target::Attempt(self.attempt), error);
    }
}

#[cfg(test)]
impl ResponseCorrelator {
    /// Expire the pending attempt.
    pub(crate) fn force_expire_pending(&self) {
        if let Some(attempt) = self.inner.lock().pending.as_mut() {
            attempt.force_expire();
        }
    }
}
