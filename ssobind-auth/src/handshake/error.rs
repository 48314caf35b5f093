//! Handshake error types.

use serde::{Deserialize, Serialize};

/// Why a returned credential failed local validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// The credential carried no identity token, or an empty one.
    #[error("missing identity token")]
    MissingIdentityToken,

    /// The identity token bytes are not UTF-8.
    #[error("identity token is not valid UTF-8")]
    TokenNotUtf8,

    /// No attempt was pending when the credential arrived.
    #[error("no pending attempt")]
    NoPendingAttempt,

    /// The pending attempt outlived its time-to-live.
    #[error("attempt expired")]
    AttemptExpired,

    /// The credential carried no nonce claim.
    #[error("missing nonce claim")]
    MissingNonceClaim,

    /// The nonce claim is not bound to the attempt's nonce.
    #[error("nonce mismatch")]
    NonceMismatch,
}

/// Failure codes reported by the authorization subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorCode {
    /// Unspecified failure.
    Unknown,
    /// The user cancelled the request.
    Canceled,
    /// The response was invalid.
    InvalidResponse,
    /// The request was not handled.
    NotHandled,
    /// The request failed.
    Failed,
    /// User interaction was required but not allowed.
    NotInteractive,
}

impl std::fmt::Display for AuthorizationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthorizationErrorCode::Unknown => "unknown",
            AuthorizationErrorCode::Canceled => "canceled",
            AuthorizationErrorCode::InvalidResponse => "invalid_response",
            AuthorizationErrorCode::NotHandled => "not_handled",
            AuthorizationErrorCode::Failed => "failed",
            AuthorizationErrorCode::NotInteractive => "not_interactive",
        };
        f.write_str(name)
    }
}

/// An error reported by the authorization subsystem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authorization failed ({code}): {message}")]
pub struct AuthorizationError {
    pub code: AuthorizationErrorCode,
    pub message: String,
}

impl AuthorizationError {
    #[must_use]
    pub fn new(code: AuthorizationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error delivered to a completion delegate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CompletionError {
    /// A recognized authorization error.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    /// Some other error the delegate does not understand.
    #[error("unrecognized completion error: {0}")]
    Unrecognized(String),
}

impl CompletionError {
    /// Whether this is a recognized authorization error.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        matches!(self, CompletionError::Authorization(_))
    }

    /// Collapse into an `AuthorizationError`.
    ///
    /// Unrecognized errors become `Unknown` so that they still end the
    /// attempt instead of leaving it pending.
    #[must_use]
    pub fn into_authorization_error(self) -> AuthorizationError {
        match self {
            CompletionError::Authorization(error) => error,
            CompletionError::Unrecognized(message) => {
                AuthorizationError::new(AuthorizationErrorCode::Unknown, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_error_display() {
        let error = AuthorizationError::new(AuthorizationErrorCode::Canceled, "user closed sheet");
        assert_eq!(
            error.to_string(),
            "authorization failed (canceled): user closed sheet"
        );
    }

    #[test]
    fn test_unrecognized_maps_to_unknown() {
        let error = CompletionError::Unrecognized("socket reset".into());
        assert!(!error.is_recognized());

        let mapped = error.into_authorization_error();
        assert_eq!(mapped.code, AuthorizationErrorCode::Unknown);
        assert_eq!(mapped.message, "socket reset");
    }

    #[test]
    fn test_recognized_passes_through() {
        let original = AuthorizationError::new(AuthorizationErrorCode::Failed, "x");
        let error = CompletionError::from(original.clone());
        assert!(error.is_recognized());
        assert_eq!(error.into_authorization_error(), original);
    }
}
