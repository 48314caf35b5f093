//! Outcome publication.
//!
//! Terminal results are broadcast to every subscription alive at emission
//! time. There is no replay: a subscription created after an event never
//! sees it. Dropping one subscription does not affect the others.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::attempt::AttemptId;
use super::error::{AuthorizationError, CredentialError};

/// Default number of undelivered events buffered per subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A validated identity token.
///
/// `Debug` is redacted; use [`IdentityToken::as_str`] to read the value.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityToken(String);

impl IdentityToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for IdentityToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IdentityToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IdentityToken").field(&"[token]").finish()
    }
}

/// Why an attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The returned credential failed local validation.
    InvalidCredential(CredentialError),
    /// The authorization subsystem reported an error.
    UnderlyingFailure(AuthorizationError),
    /// The attempt was cancelled or superseded before completing.
    Cancelled,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidCredential(e) => write!(f, "invalid credential: {e}"),
            RejectReason::UnderlyingFailure(e) => write!(f, "{e}"),
            RejectReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated(IdentityToken),
    Rejected(RejectReason),
}

impl AuthenticationOutcome {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthenticationOutcome::Authenticated(_))
    }

    #[must_use]
    pub fn identity_token(&self) -> Option<&IdentityToken> {
        match self {
            AuthenticationOutcome::Authenticated(token) => Some(token),
            AuthenticationOutcome::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            AuthenticationOutcome::Authenticated(_) => None,
            AuthenticationOutcome::Rejected(reason) => Some(reason),
        }
    }
}

/// An outcome tagged with the attempt it ends.
///
/// `attempt` is `None` when a completion arrived while no attempt existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEvent {
    pub attempt: Option<AttemptId>,
    pub outcome: AuthenticationOutcome,
}

/// Single-producer, multi-subscriber outcome stream.
#[derive(Debug, Clone)]
pub struct OutcomeChannel {
    sender: broadcast::Sender<OutcomeEvent>,
}

impl OutcomeChannel {
    /// Create a channel buffering up to `capacity` events per subscriber.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attach a new subscriber. It receives only events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> OutcomeSubscription {
        OutcomeSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event to every live subscription.
    ///
    /// Returns how many subscriptions it reached. Publishing with none is not
    /// an error; the event is simply not observed.
    pub fn publish(&self, event: OutcomeEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(broadcast::error::SendError(event)) => {
                tracing::debug!(attempt = ?event.attempt, "outcome published with no subscribers");
                0
            }
        }
    }
}

impl Default for OutcomeChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// One subscriber's view of an [`OutcomeChannel`].
#[derive(Debug)]
pub struct OutcomeSubscription {
    receiver: broadcast::Receiver<OutcomeEvent>,
}

impl OutcomeSubscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once the producer is gone and the buffer is drained.
    /// A subscriber that fell behind skips the overwritten events.
    pub async fn recv(&mut self) -> Option<OutcomeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "outcome subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<OutcomeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "outcome subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
