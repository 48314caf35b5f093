//! Nonce values and the secure generator.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::entropy::{EntropySource, OsEntropy};
use super::NonceError;

/// Default raw nonce length in characters.
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Largest raw nonce length in characters.
pub const MAX_NONCE_LENGTH: usize = 1024;

/// Symbols a raw nonce is drawn from.
///
/// Each random byte maps to `CHARSET[byte % CHARSET.len()]`. The set has 64
/// symbols (it has no `W`), so the mapping is uniform. A set whose length
/// does not divide 256 skews toward its leading symbols; that bias is
/// accepted rather than corrected by rejection sampling.
pub const CHARSET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

/// Compute the lowercase hex SHA-256 digest of a string's UTF-8 bytes.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// A single-use secret and its public commitment.
///
/// `raw` stays with the caller; only `digest` is ever sent to the
/// authorization subsystem. The digest is always `sha256_hex(raw)`.
///
/// # Security
///
/// The raw value is zeroized on drop and redacted from `Debug` output.
/// Comparisons use constant-time equality.
#[derive(Clone)]
pub struct Nonce {
    raw: Zeroizing<String>,
    digest: String,
}

impl Nonce {
    /// Build a nonce from an existing raw value, deriving its digest.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = Zeroizing::new(raw.into());
        let digest = sha256_hex(&raw);
        Self { raw, digest }
    }

    /// The raw secret. Never transmit this.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The hex digest sent in the authorization request.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Check a candidate against the raw secret in constant time.
    #[must_use]
    pub fn matches_raw(&self, candidate: &str) -> bool {
        self.raw.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Check a candidate against the digest in constant time.
    #[must_use]
    pub fn matches_digest(&self, candidate: &str) -> bool {
        self.digest.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nonce")
            .field("raw", &"[redacted]")
            .field("digest", &self.digest)
            .finish()
    }
}

/// Produces fresh nonces, one per authentication attempt.
///
/// Substitutable so that controllers can be driven by fixed nonces in tests.
pub trait NonceGenerator: Send + Sync {
    /// Generate a new nonce.
    ///
    /// # Errors
    ///
    /// Returns an error if no secure nonce could be produced. No partial
    /// nonce is ever returned.
    fn generate(&self) -> Result<Nonce, NonceError>;
}

/// Nonce generator backed by a secure entropy source.
#[derive(Debug, Clone)]
pub struct SecureNonceGenerator<E = OsEntropy> {
    entropy: E,
    length: usize,
}

impl SecureNonceGenerator {
    /// Create a generator using the OS CSPRNG and the default length.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entropy(OsEntropy)
    }
}

impl Default for SecureNonceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntropySource> SecureNonceGenerator<E> {
    /// Create a generator over a custom entropy source.
    #[must_use]
    pub fn with_entropy(entropy: E) -> Self {
        Self {
            entropy,
            length: DEFAULT_NONCE_LENGTH,
        }
    }

    /// Set the raw nonce length in characters.
    ///
    /// A length of zero or above [`MAX_NONCE_LENGTH`] is rejected at
    /// generation time.
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// The configured raw nonce length.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl<E: EntropySource> NonceGenerator for SecureNonceGenerator<E> {
    fn generate(&self) -> Result<Nonce, NonceError> {
        if !(1..=MAX_NONCE_LENGTH).contains(&self.length) {
            return Err(NonceError::InvalidLength);
        }

        let mut bytes = Zeroizing::new(vec![0u8; self.length]);
        self.entropy.fill(bytes.as_mut_slice())?;

        let raw: String = bytes
            .iter()
            .map(|byte| char::from(CHARSET[usize::from(*byte) % CHARSET.len()]))
            .collect();

        Ok(Nonce::from_raw(raw))
    }
}
