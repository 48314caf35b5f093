//! Attempt orchestration.

use crate::challenge::{AuthorizationDispatcher, ChallengeIssuer};
use crate::config::AuthConfig;
use crate::nonce::{NonceError, NonceGenerator};

use super::attempt::AttemptId;
use super::correlator::ResponseCorrelator;
use super::outcome::OutcomeSubscription;

/// Runs one authentication attempt end to end.
///
/// `authenticate` generates a nonce, builds a request carrying its digest,
/// records the raw nonce in the correlator, then dispatches the request with
/// the attempt's completion handle. The raw nonce is stored before dispatch,
/// so no completion can observe a missing attempt.
pub struct Authenticator<G, D> {
    generator: G,
    issuer: ChallengeIssuer,
    dispatcher: D,
    correlator: ResponseCorrelator,
}

impl<G: NonceGenerator, D: AuthorizationDispatcher> Authenticator<G, D> {
    /// Build an authenticator from a config.
    #[must_use]
    pub fn new(generator: G, dispatcher: D, config: &AuthConfig) -> Self {
        Self::with_parts(
            generator,
            ChallengeIssuer::with_scopes(config.scopes.iter().copied()),
            dispatcher,
            ResponseCorrelator::new(config),
        )
    }

    /// Build an authenticator from explicit parts.
    #[must_use]
    pub fn with_parts(
        generator: G,
        issuer: ChallengeIssuer,
        dispatcher: D,
        correlator: ResponseCorrelator,
    ) -> Self {
        Self {
            generator,
            issuer,
            dispatcher,
            correlator,
        }
    }

    /// Subscribe to outcomes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> OutcomeSubscription {
        self.correlator.subscribe()
    }

    #[must_use]
    pub fn correlator(&self) -> &ResponseCorrelator {
        &self.correlator
    }

    #[must_use]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Start an attempt and dispatch its request.
    ///
    /// The outcome arrives later on the outcome channel.
    ///
    /// # Errors
    ///
    /// Returns `NonceError` if no secure nonce could be generated. Nothing
    /// is started or dispatched in that case.
    pub fn authenticate(&self) -> Result<AttemptId, NonceError> {
        let nonce = self.generator.generate().inspect_err(|e| {
            tracing::error!(error = %e, "nonce generation failed");
        })?;

        let request = self.issuer.build_request(nonce.digest());
        let handle = self.correlator.start_attempt(nonce.raw());
        let attempt = handle.attempt();

        tracing::debug!(attempt = %attempt, scopes = ?request.scopes, "dispatching authorization request");
        self.dispatcher.perform(vec![request], handle);

        Ok(attempt)
    }
}
