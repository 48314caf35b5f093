//! End-to-end tests for the nonce handshake.
//!
//! The dispatcher here behaves like a real authorization subsystem: it
//! completes asynchronously on another task, knowing only the request.

use std::sync::Mutex;
use std::time::Duration;

use ssobind_auth::nonce::sha256_hex;
use ssobind_auth::{
    AuthConfig, AuthenticationOutcome, Authenticator, AuthorizationDispatcher,
    AuthorizationError, AuthorizationErrorCode, AuthorizationRequest, CompletionError,
    CompletionHandle, CredentialError, IdTokenClaims, IdentityCredential, Nonce, NonceBinding,
    NonceError, NonceGenerator, OutcomeSubscription, RejectReason, ResponseCorrelator,
    SecureNonceGenerator,
};

/// How the simulated issuer answers.
#[derive(Clone)]
enum Reply {
    /// Echo the request nonce into the token's nonce claim.
    EchoNonce,
    /// Put an unrelated nonce into the token.
    WrongNonce,
    Error(CompletionError),
}

/// Issuer that answers each batch from a spawned task.
struct AsyncIssuer {
    reply: Reply,
    seen: Mutex<Vec<AuthorizationRequest>>,
}

impl AsyncIssuer {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl AuthorizationDispatcher for AsyncIssuer {
    fn perform(&self, requests: Vec<AuthorizationRequest>, delegate: CompletionHandle) {
        self.seen.lock().unwrap().extend(requests.iter().cloned());
        let reply = self.reply.clone();
        let request_nonce = requests[0].nonce.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            match reply {
                Reply::EchoNonce => {
                    delegate.complete_with_authorization(&credential_with_nonce(request_nonce));
                }
                Reply::WrongNonce => {
                    let nonce = sha256_hex("someone else");
                    delegate.complete_with_authorization(&credential_with_nonce(nonce));
                }
                Reply::Error(error) => delegate.complete_with_error(error),
            }
        });
    }
}

fn credential_with_nonce(nonce: String) -> IdentityCredential {
    let token = IdTokenClaims {
        sub: Some("001234.abcd".into()),
        nonce: Some(nonce),
        ..Default::default()
    }
    .encode_unsigned();
    IdentityCredential::new(token)
}

/// Generator returning a fixed raw nonce.
struct Fixed(&'static str);

impl NonceGenerator for Fixed {
    fn generate(&self) -> Result<Nonce, NonceError> {
        Ok(Nonce::from_raw(self.0))
    }
}

fn digest_config() -> AuthConfig {
    AuthConfig {
        nonce_binding: NonceBinding::Digest,
        ..Default::default()
    }
}

async fn next_outcome(subscription: &mut OutcomeSubscription) -> AuthenticationOutcome {
    tokio::time::timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("outcome within timeout")
        .expect("channel open")
        .outcome
}

#[tokio::test]
async fn test_full_handshake_authenticates() {
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::EchoNonce),
        &digest_config(),
    );
    let mut outcomes = sut.subscribe();

    sut.authenticate().unwrap();

    let outcome = next_outcome(&mut outcomes).await;
    assert!(outcome.is_authenticated(), "got {outcome:?}");
    let claims =
        IdTokenClaims::decode_unverified(outcome.identity_token().unwrap().as_str()).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("001234.abcd"));
}

#[tokio::test]
async fn test_request_never_carries_raw_nonce() {
    let sut = Authenticator::new(
        Fixed("abc123"),
        AsyncIssuer::new(Reply::EchoNonce),
        &digest_config(),
    );
    let mut outcomes = sut.subscribe();

    sut.authenticate().unwrap();
    next_outcome(&mut outcomes).await;

    let seen = sut.dispatcher().seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].nonce, sha256_hex("abc123"));
    assert_ne!(seen[0].nonce, "abc123");
}

#[tokio::test]
async fn test_wrong_nonce_rejected() {
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::WrongNonce),
        &digest_config(),
    );
    let mut outcomes = sut.subscribe();

    sut.authenticate().unwrap();

    assert_eq!(
        next_outcome(&mut outcomes).await,
        AuthenticationOutcome::Rejected(RejectReason::InvalidCredential(
            CredentialError::NonceMismatch
        ))
    );
}

#[tokio::test]
async fn test_echoed_digest_fails_raw_binding() {
    // An issuer echoing the digest does not satisfy a raw binding.
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::EchoNonce),
        &AuthConfig::default(),
    );
    let mut outcomes = sut.subscribe();

    sut.authenticate().unwrap();

    assert_eq!(
        next_outcome(&mut outcomes).await,
        AuthenticationOutcome::Rejected(RejectReason::InvalidCredential(
            CredentialError::NonceMismatch
        ))
    );
}

#[tokio::test]
async fn test_issuer_error_rejected() {
    let error = AuthorizationError::new(AuthorizationErrorCode::Canceled, "user cancelled");
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::Error(error.clone().into())),
        &AuthConfig::default(),
    );
    let mut outcomes = sut.subscribe();

    sut.authenticate().unwrap();

    assert_eq!(
        next_outcome(&mut outcomes).await,
        AuthenticationOutcome::Rejected(RejectReason::UnderlyingFailure(error))
    );
    assert!(!sut.correlator().is_pending());
}

#[tokio::test]
async fn test_every_subscriber_sees_outcome() {
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::EchoNonce),
        &digest_config(),
    );
    let mut first = sut.subscribe();
    let mut second = sut.subscribe();
    let cancelled = sut.subscribe();
    drop(cancelled);

    let attempt = sut.authenticate().unwrap();

    let a = tokio::time::timeout(Duration::from_secs(2), first.recv())
        .await
        .unwrap()
        .unwrap();
    let b = tokio::time::timeout(Duration::from_secs(2), second.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.attempt, Some(attempt));
}

#[tokio::test]
async fn test_second_attempt_is_independent() {
    let sut = Authenticator::new(
        SecureNonceGenerator::new(),
        AsyncIssuer::new(Reply::EchoNonce),
        &digest_config(),
    );
    let mut outcomes = sut.subscribe();

    let first = sut.authenticate().unwrap();
    assert!(next_outcome(&mut outcomes).await.is_authenticated());

    let second = sut.authenticate().unwrap();
    assert_ne!(first, second);
    assert!(next_outcome(&mut outcomes).await.is_authenticated());
}

#[test]
fn test_scenario_matching_claim() {
    let sut = ResponseCorrelator::new(&AuthConfig::default());
    let mut outcomes = sut.subscribe();

    sut.start_attempt("abc123");
    sut.on_success(&IdentityCredential::new("xyz").with_nonce_claim("abc123"));

    assert_eq!(
        outcomes.try_recv().unwrap().outcome,
        AuthenticationOutcome::Authenticated("xyz".into())
    );
}

#[test]
fn test_scenario_different_claim() {
    let sut = ResponseCorrelator::new(&AuthConfig::default());
    let mut outcomes = sut.subscribe();

    sut.start_attempt("abc123");
    sut.on_success(&IdentityCredential::new("xyz").with_nonce_claim("different"));

    assert_eq!(
        outcomes.try_recv().unwrap().outcome,
        AuthenticationOutcome::Rejected(RejectReason::InvalidCredential(
            CredentialError::NonceMismatch
        ))
    );
}

#[test]
fn test_generated_nonce_properties() {
    for length in 1..=64 {
        let nonce = SecureNonceGenerator::new()
            .with_length(length)
            .generate()
            .unwrap();
        assert_eq!(nonce.raw().chars().count(), length);
        assert_eq!(nonce.digest(), sha256_hex(nonce.raw()));
        assert_eq!(nonce.digest().len(), 64);
        assert!(nonce.digest().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
