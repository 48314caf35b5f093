//! In-process issuer for `ssobind simulate`.
//!
//! Plays the external authorization subsystem: it answers each batch from a
//! spawned task with an unsigned identity token that echoes the request
//! nonce, as issuers binding the request nonce verbatim do.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ssobind_auth::nonce::sha256_hex;
use ssobind_auth::{
    AuthorizationDispatcher, AuthorizationError, AuthorizationErrorCode, AuthorizationRequest,
    CompletionError, CompletionHandle, IdTokenClaims, IdentityCredential, Scope,
};

/// Issuer name placed in loopback tokens.
pub const LOOPBACK_ISSUER: &str = "urn:ssobind:loopback";

const LOOPBACK_SUBJECT: &str = "loopback-user";
const TOKEN_LIFETIME_SECS: i64 = 600;

/// How the loopback issuer answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Issue a token bound to the request nonce.
    Issue,
    /// Issue a token bound to some other nonce.
    Tamper,
    /// Fail with an authorization error.
    Fail(AuthorizationErrorCode),
    /// Fail with an error outside the authorization taxonomy.
    Unrecognized,
}

pub struct LoopbackIssuer {
    behavior: Behavior,
    latency: Duration,
}

impl LoopbackIssuer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            latency: Duration::from_millis(20),
        }
    }
}

impl AuthorizationDispatcher for LoopbackIssuer {
    fn perform(&self, requests: Vec<AuthorizationRequest>, delegate: CompletionHandle) {
        let Some(request) = requests.into_iter().next() else {
            tracing::warn!(attempt = %delegate.attempt(), "empty request batch");
            delegate.complete_with_error(
                AuthorizationError::new(AuthorizationErrorCode::InvalidResponse, "empty request batch")
                    .into(),
            );
            return;
        };

        let behavior = self.behavior.clone();
        let latency = self.latency;
        tracing::debug!(attempt = %delegate.attempt(), ?behavior, "loopback issuer received request");

        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            match behavior {
                Behavior::Issue => {
                    delegate.complete_with_authorization(&issue(&request, &request.nonce));
                }
                Behavior::Tamper => {
                    let forged = sha256_hex(&request.nonce);
                    delegate.complete_with_authorization(&issue(&request, &forged));
                }
                Behavior::Fail(code) => delegate.complete_with_error(
                    AuthorizationError::new(code, "loopback issuer refused the request").into(),
                ),
                Behavior::Unrecognized => delegate.complete_with_error(
                    CompletionError::Unrecognized("loopback transport reset".into()),
                ),
            }
        });
    }
}

/// Build the credential the loopback issuer returns for `request`.
fn issue(request: &AuthorizationRequest, nonce: &str) -> IdentityCredential {
    let iat = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok());
    let email = request
        .scopes
        .contains(&Scope::Email)
        .then(|| format!("{LOOPBACK_SUBJECT}@loopback.invalid"));

    let claims = IdTokenClaims {
        iss: Some(LOOPBACK_ISSUER.to_string()),
        sub: Some(LOOPBACK_SUBJECT.to_string()),
        email: email.clone(),
        nonce: Some(nonce.to_string()),
        iat,
        exp: iat.map(|t| t + TOKEN_LIFETIME_SECS),
    };

    let mut credential =
        IdentityCredential::new(claims.encode_unsigned()).with_user(LOOPBACK_SUBJECT);
    if let Some(email) = email {
        credential = credential.with_email(email);
    }
    if request.scopes.contains(&Scope::FullName) {
        credential = credential.with_full_name("Loopback User");
    }
    credential
}
