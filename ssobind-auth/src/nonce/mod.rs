//! Nonce generation.
//!
//! A nonce is a random raw secret plus its SHA-256 hex digest. The digest
//! goes out in the authorization request; the raw value stays local and is
//! later compared against the nonce claim of the returned credential.

mod entropy;
mod error;
mod generator;

pub use entropy::{EntropySource, OsEntropy};
pub use error::NonceError;
pub use generator::{
    sha256_hex, Nonce, NonceGenerator, SecureNonceGenerator, CHARSET, DEFAULT_NONCE_LENGTH,
    MAX_NONCE_LENGTH,
};
