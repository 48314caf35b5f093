//! Secure random sources for nonce generation.

use rand::rngs::OsRng;
use rand::RngCore;

use super::NonceError;

/// Source of cryptographically secure random bytes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single generator is shared by
/// every attempt a controller starts.
///
/// # Contract
///
/// `fill` either fills the whole buffer or fails. There is no partial
/// success and no fallback to a non-secure generator.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns `NonceError::SecureRandomUnavailable` if the source failed.
    fn fill(&self, dest: &mut [u8]) -> Result<(), NonceError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), NonceError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| NonceError::SecureRandomUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_entropy_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsEntropy.fill(&mut a).unwrap();
        OsEntropy.fill(&mut b).unwrap();

        // 256 bits colliding would mean the source is broken
        assert_ne!(a, b);
    }

    #[test]
    fn test_os_entropy_accepts_empty_buffer() {
        let mut empty: [u8; 0] = [];
        assert!(OsEntropy.fill(&mut empty).is_ok());
    }
}
