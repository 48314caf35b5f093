//! Identity token claim decoding.
//!
//! Identity tokens are JWTs (`header.payload.signature`, base64url). Only the
//! payload is decoded here, to read the claims the handshake binds against.
//! Signature verification belongs to the relying party and is not performed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Errors decoding an identity token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IdTokenError {
    /// The token is not three dot-separated segments.
    #[error("malformed token")]
    Malformed,

    /// The payload segment is not valid base64url.
    #[error("invalid payload encoding")]
    Encoding,

    /// The payload is not a JSON claims object.
    #[error("invalid claims: {0}")]
    Claims(String),
}

/// Claims carried by an identity token that the handshake cares about.
///
/// Unknown claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Stable user identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// User email, when the email scope was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Nonce bound into the token by the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Issued-at, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    /// Decode the claims of a JWT without verifying its signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a three-segment JWT or its
    /// payload is not a base64url JSON object.
    pub fn decode_unverified(token: &str) -> Result<Self, IdTokenError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(IdTokenError::Malformed);
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| IdTokenError::Encoding)?;

        serde_json::from_slice(&bytes).map_err(|e| IdTokenError::Claims(e.to_string()))
    }

    /// Encode these claims as an unsigned JWT (`alg: none`).
    ///
    /// Intended for loopback issuers and tests; nothing here is trustworthy
    /// without a signature.
    #[must_use]
    pub fn encode_unsigned(&self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        // Serializing a struct of strings and integers cannot fail.
        let payload = serde_json::to_vec(self).unwrap_or_default();
        format!("{header}.{}.", URL_SAFE_NO_PAD.encode(payload))
    }
}
