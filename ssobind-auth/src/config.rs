//! Handshake configuration.

use serde::{Deserialize, Serialize};

use crate::challenge::{Scope, DEFAULT_SCOPES};
use crate::handshake::DEFAULT_CHANNEL_CAPACITY;
use crate::nonce::{DEFAULT_NONCE_LENGTH, MAX_NONCE_LENGTH};

/// Default attempt time-to-live.
pub const DEFAULT_ATTEMPT_TTL_SECS: u64 = 300;

/// Upper bound on attempt time-to-live.
pub const MAX_ATTEMPT_TTL_SECS: u64 = 3600;

/// Environment variable overriding [`AuthConfig::nonce_length`].
pub const ENV_NONCE_LENGTH: &str = "SSOBIND_NONCE_LENGTH";
/// Environment variable overriding [`AuthConfig::nonce_binding`].
pub const ENV_NONCE_BINDING: &str = "SSOBIND_NONCE_BINDING";
/// Environment variable overriding [`AuthConfig::attempt_ttl_secs`].
pub const ENV_ATTEMPT_TTL_SECS: &str = "SSOBIND_ATTEMPT_TTL_SECS";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("nonce length must be greater than zero")]
    ZeroNonceLength,

    #[error("nonce length must be at most 1024")]
    NonceLengthTooLarge,

    #[error("at least one scope must be requested")]
    NoScopes,

    #[error("attempt ttl must be between 1 and 3600 seconds")]
    AttemptTtlOutOfRange,

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

/// How a credential's nonce claim must relate to the attempt's raw nonce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonceBinding {
    /// The claim equals the raw nonce.
    #[default]
    Raw,
    /// The claim equals the nonce digest, for issuers that echo the request
    /// nonce verbatim into the token.
    Digest,
}

impl std::str::FromStr for NonceBinding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(NonceBinding::Raw),
            "digest" => Ok(NonceBinding::Digest),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for NonceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonceBinding::Raw => write!(f, "raw"),
            NonceBinding::Digest => write!(f, "digest"),
        }
    }
}

/// Handshake settings.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Raw nonce length in characters.
    pub nonce_length: usize,
    /// Scopes requested in every authorization request.
    pub scopes: Vec<Scope>,
    /// How nonce claims are checked.
    pub nonce_binding: NonceBinding,
    /// Seconds a pending attempt stays valid.
    pub attempt_ttl_secs: u64,
    /// Undelivered events buffered per outcome subscriber.
    pub channel_capacity: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            nonce_length: DEFAULT_NONCE_LENGTH,
            scopes: DEFAULT_SCOPES.to_vec(),
            nonce_binding: NonceBinding::default(),
            attempt_ttl_secs: DEFAULT_ATTEMPT_TTL_SECS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AuthConfig {
    /// Defaults overlaid with the `SSOBIND_*` environment variables.
    ///
    /// Recognized variables:
    /// - `SSOBIND_NONCE_LENGTH`
    /// - `SSOBIND_NONCE_BINDING` (`raw` or `digest`)
    /// - `SSOBIND_ATTEMPT_TTL_SECS`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` for unparsable values, or any
    /// error from [`AuthConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Overlay values from a variable lookup onto this config.
    ///
    /// # Errors
    ///
    /// Same as [`AuthConfig::from_env`].
    pub fn overlay(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_NONCE_LENGTH) {
            self.nonce_length = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_NONCE_LENGTH,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_NONCE_BINDING) {
            self.nonce_binding = value.parse().map_err(|()| ConfigError::InvalidEnv {
                name: ENV_NONCE_BINDING,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_ATTEMPT_TTL_SECS) {
            self.attempt_ttl_secs = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_ATTEMPT_TTL_SECS,
                value,
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check invariants the handshake relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nonce_length == 0 {
            return Err(ConfigError::ZeroNonceLength);
        }
        if self.nonce_length > MAX_NONCE_LENGTH {
            return Err(ConfigError::NonceLengthTooLarge);
        }
        if self.scopes.is_empty() {
            return Err(ConfigError::NoScopes);
        }
        if !(1..=MAX_ATTEMPT_TTL_SECS).contains(&self.attempt_ttl_secs) {
            return Err(ConfigError::AttemptTtlOutOfRange);
        }
        Ok(())
    }

    /// Attempt time-to-live, clamped to the supported range.
    #[must_use]
    pub fn attempt_ttl(&self) -> chrono::Duration {
        let secs = self.attempt_ttl_secs.clamp(1, MAX_ATTEMPT_TTL_SECS);
        // Bounded by MAX_ATTEMPT_TTL_SECS, so the conversion is lossless.
        chrono::Duration::seconds(secs as i64)
    }
}
