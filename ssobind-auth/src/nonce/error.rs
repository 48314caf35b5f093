//! Nonce generation error types.

/// Errors that can occur while generating a nonce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NonceError {
    /// The requested nonce length was zero or above the maximum.
    #[error("nonce length must be between 1 and 1024")]
    InvalidLength,

    /// The secure random source could not supply bytes.
    ///
    /// This is fatal. Callers must not retry with a weaker source.
    #[error("secure random source unavailable: {0}")]
    SecureRandomUnavailable(String),
}
