//! Credentials returned by the authorization subsystem.

mod id_token;

pub use id_token::{IdTokenClaims, IdTokenError};

/// Capability view of an externally issued credential.
///
/// The correlator only needs the identity token and the nonce claim, so any
/// platform credential type can be adapted without wrapping it.
pub trait Credential {
    /// Raw identity token bytes, if the issuer returned one.
    fn identity_token(&self) -> Option<&[u8]>;

    /// The nonce claim bound into the credential.
    ///
    /// The default reads the `nonce` claim of the identity token decoded as
    /// an unsigned JWT.
    fn nonce_claim(&self) -> Option<String> {
        claim_from_token(self.identity_token()?)
    }
}

/// Read the `nonce` claim of a token decoded as an unsigned JWT.
fn claim_from_token(token: &[u8]) -> Option<String> {
    let token = std::str::from_utf8(token).ok()?;
    IdTokenClaims::decode_unverified(token).ok()?.nonce
}

/// A concrete identity credential.
///
/// An explicit nonce claim, when set, takes precedence over the one embedded
/// in the identity token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct IdentityCredential {
    identity_token: Option<Vec<u8>>,
    nonce_claim: Option<String>,
    user: Option<String>,
    email: Option<String>,
    full_name: Option<String>,
}

impl IdentityCredential {
    /// Create a credential carrying an identity token.
    #[must_use]
    pub fn new(identity_token: impl Into<Vec<u8>>) -> Self {
        Self {
            identity_token: Some(identity_token.into()),
            ..Default::default()
        }
    }

    /// Create a credential with no identity token.
    #[must_use]
    pub fn without_token() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_nonce_claim(mut self, nonce: impl Into<String>) -> Self {
        self.nonce_claim = Some(nonce.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Stable user identifier, if provided.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Email, if the scope was granted.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Full name, if the scope was granted.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }
}

impl Credential for IdentityCredential {
    fn identity_token(&self) -> Option<&[u8]> {
        self.identity_token.as_deref()
    }

    fn nonce_claim(&self) -> Option<String> {
        if let Some(claim) = &self.nonce_claim {
            return Some(claim.clone());
        }
        claim_from_token(self.identity_token()?)
    }
}

impl std::fmt::Debug for IdentityCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCredential")
            .field("identity_token", &self.identity_token.as_ref().map(|_| "[token]"))
            .field("nonce_claim", &self.nonce_claim.as_ref().map(|_| "[nonce]"))
            .field("user", &self.user)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Credential exposing only a token, relying on the default claim lookup.
    struct TokenOnly(Vec<u8>);

    impl Credential for TokenOnly {
        fn identity_token(&self) -> Option<&[u8]> {
            Some(&self.0)
        }
    }

    fn jwt_with_nonce(nonce: &str) -> String {
        IdTokenClaims {
            nonce: Some(nonce.into()),
            ..Default::default()
        }
        .encode_unsigned()
    }

    #[test]
    fn test_default_nonce_claim_reads_jwt() {
        let credential = TokenOnly(jwt_with_nonce("abc123").into_bytes());
        assert_eq!(credential.nonce_claim().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_default_nonce_claim_none_for_opaque_token() {
        let credential = TokenOnly(b"anydata".to_vec());
        assert_eq!(credential.nonce_claim(), None);
    }

    #[test]
    fn test_explicit_claim_wins_over_embedded() {
        let credential =
            IdentityCredential::new(jwt_with_nonce("embedded")).with_nonce_claim("explicit");
        assert_eq!(credential.nonce_claim().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_embedded_claim_used_without_explicit() {
        let credential = IdentityCredential::new(jwt_with_nonce("embedded"));
        assert_eq!(credential.nonce_claim().as_deref(), Some("embedded"));
    }

    #[test]
    fn test_without_token() {
        let credential = IdentityCredential::without_token();
        assert!(credential.identity_token().is_none());
        assert!(credential.nonce_claim().is_none());
    }

    #[test]
    fn test_debug_redacts_token_and_nonce() {
        let credential = IdentityCredential::new("secret-token")
            .with_nonce_claim("secret-nonce")
            .with_email("a@example.com");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("secret-nonce"));
        assert!(debug.contains("a@example.com"));
    }
}
