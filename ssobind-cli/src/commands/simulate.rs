//! `simulate` command: one full handshake against the loopback issuer.

use std::time::Duration;

use anyhow::{Context, Result};
use ssobind_auth::{
    AuthConfig, AuthenticationOutcome, Authenticator, IdTokenClaims, NonceBinding, OutcomeEvent,
    SecureNonceGenerator,
};

use crate::loopback::{Behavior, LoopbackIssuer};

/// Exit code when the handshake ends rejected.
pub const EXIT_REJECTED: i32 = 2;

/// Run one attempt and print its outcome.
///
/// Returns the process exit code: 0 when authenticated, [`EXIT_REJECTED`]
/// otherwise.
pub async fn cmd_simulate(
    config: AuthConfig,
    behavior: Behavior,
    timeout: Duration,
    json: bool,
) -> Result<i32> {
    if config.nonce_binding != NonceBinding::Digest {
        tracing::warn!(
            configured = %config.nonce_binding,
            "loopback issuer echoes the digest; overriding nonce binding to digest"
        );
        if !json {
            eprintln!(
                "note: configured nonce binding '{}' ignored; simulate uses 'digest'",
                config.nonce_binding
            );
        }
    }
    let config = AuthConfig {
        nonce_binding: NonceBinding::Digest,
        ..config
    };

    let authenticator = Authenticator::new(
        SecureNonceGenerator::new().with_length(config.nonce_length),
        LoopbackIssuer::new(behavior),
        &config,
    );
    let mut outcomes = authenticator.subscribe();

    let attempt = authenticator
        .authenticate()
        .context("Failed to start authentication attempt")?;
    tracing::info!(attempt = %attempt, "waiting for outcome");

    let event = tokio::time::timeout(timeout, outcomes.recv())
        .await
        .context("Timed out waiting for outcome")?
        .context("Outcome channel closed")?;

    if json {
        println!("{}", serde_json::to_string(&event_to_json(&event))?);
    } else {
        println!("{}", describe(&event));
    }

    Ok(if event.outcome.is_authenticated() {
        0
    } else {
        EXIT_REJECTED
    })
}

fn subject(outcome: &AuthenticationOutcome) -> Option<String> {
    let token = outcome.identity_token()?;
    IdTokenClaims::decode_unverified(token.as_str()).ok()?.sub
}

fn describe(event: &OutcomeEvent) -> String {
    let attempt = event
        .attempt
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    match &event.outcome {
        AuthenticationOutcome::Authenticated(_) => format!(
            "attempt {attempt}: authenticated (sub={})",
            subject(&event.outcome).unwrap_or_else(|| "unknown".to_string())
        ),
        AuthenticationOutcome::Rejected(reason) => format!("attempt {attempt}: rejected: {reason}"),
    }
}

fn event_to_json(event: &OutcomeEvent) -> serde_json::Value {
    serde_json::json!({
        "attempt": event.attempt.map(|id| id.get()),
        "status": if event.outcome.is_authenticated() { "authenticated" } else { "rejected" },
        "reason": event.outcome.reject_reason().map(ToString::to_string),
        "subject": subject(&event.outcome),
    })
}
