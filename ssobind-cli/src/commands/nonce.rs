//! `nonce` and `digest` commands.

use anyhow::{Context, Result};
use ssobind_auth::nonce::sha256_hex;
use ssobind_auth::{AuthConfig, NonceGenerator, SecureNonceGenerator};

/// Print `count` fresh nonces, one per line.
pub fn cmd_nonce(config: &AuthConfig, length: Option<usize>, count: usize, json: bool) -> Result<()> {
    let generator =
        SecureNonceGenerator::new().with_length(length.unwrap_or(config.nonce_length));

    for _ in 0..count {
        let nonce = generator.generate().context("Failed to generate nonce")?;
        if json {
            let view = serde_json::json!({
                "raw": nonce.raw(),
                "digest": nonce.digest(),
            });
            println!("{}", serde_json::to_string(&view)?);
        } else {
            println!("{}  {}", nonce.raw(), nonce.digest());
        }
    }

    Ok(())
}

/// Print the digest of a raw nonce.
pub fn cmd_digest(raw: &str, json: bool) -> Result<()> {
    let digest = sha256_hex(raw);
    if json {
        println!("{}", serde_json::to_string(&serde_json::json!({ "digest": digest }))?);
    } else {
        println!("{digest}");
    }
    Ok(())
}
