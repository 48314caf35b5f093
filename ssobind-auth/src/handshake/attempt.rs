//! Authentication attempt state.
//!
//! Two states: Pending (an attempt exists) → Terminal (it was taken out and
//! an outcome published). The correlator is idle whenever no attempt exists.

use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::config::NonceBinding;
use crate::nonce::sha256_hex;

/// Identifier of one attempt, unique per correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl AttemptId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pending authentication attempt.
///
/// Holds the raw nonce whose digest went out with the request. Created when
/// an attempt starts and consumed by exactly one completion.
///
/// # Security
///
/// The raw nonce is zeroized on drop and compared in constant time.
pub struct AuthenticationAttempt {
    id: AttemptId,
    raw_nonce: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl AuthenticationAttempt {
    #[must_use]
    pub(crate) fn new(id: AttemptId, raw_nonce: &str, ttl: Duration) -> Self {
        Self {
            id,
            raw_nonce: Zeroizing::new(raw_nonce.to_string()),
            expires_at: Utc::now() + ttl,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check whether `claim` is bound to this attempt's nonce.
    #[must_use]
    pub fn nonce_matches(&self, claim: &str, binding: NonceBinding) -> bool {
        match binding {
            NonceBinding::Raw => self.raw_nonce.as_bytes().ct_eq(claim.as_bytes()).into(),
            NonceBinding::Digest => sha256_hex(&self.raw_nonce)
                .as_bytes()
                .ct_eq(claim.as_bytes())
                .into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_expire(&mut self) {
        self.expires_at = Utc::now() - Duration::seconds(1);
    }
}

impl std::fmt::Debug for AuthenticationAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationAttempt")
            .field("id", &self.id)
            .field("raw_nonce", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(raw: &str) -> AuthenticationAttempt {
        AuthenticationAttempt::new(AttemptId::new(1), raw, Duration::minutes(5))
    }

    #[test]
    fn test_not_expired_initially() {
        assert!(!attempt("abc123").is_expired());
    }

    #[test]
    fn test_expires_after_time() {
        let mut attempt = attempt("abc123");
        attempt.force_expire();
        assert!(attempt.is_expired());
    }

    #[test]
    fn test_raw_binding() {
        let attempt = attempt("abc123");
        assert!(attempt.nonce_matches("abc123", NonceBinding::Raw));
        assert!(!attempt.nonce_matches("different", NonceBinding::Raw));
        assert!(!attempt.nonce_matches("", NonceBinding::Raw));
    }

    #[test]
    fn test_digest_binding() {
        let attempt = attempt("abc123");
        assert!(attempt.nonce_matches(&sha256_hex("abc123"), NonceBinding::Digest));
        assert!(!attempt.nonce_matches("abc123", NonceBinding::Digest));
    }

    #[test]
    fn test_debug_redacts_nonce() {
        let debug = format!("{:?}", attempt("top-secret"));
        assert!(!debug.contains("top-secret"));
    }
}
