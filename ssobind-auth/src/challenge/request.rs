//! Authorization request types.

use serde::{Deserialize, Serialize};

/// Identity scope requested from the authorization subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The user's email address.
    Email,
    /// The user's full name.
    FullName,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Email => write!(f, "email"),
            Scope::FullName => write!(f, "full_name"),
        }
    }
}

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPES: [Scope; 2] = [Scope::Email, Scope::FullName];

/// An outbound authorization request.
///
/// `nonce` carries the nonce *digest*, never the raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Requested identity scopes.
    pub scopes: Vec<Scope>,
    /// Nonce digest the issuer binds into the identity token.
    pub nonce: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_serializes_snake_case() {
        let json = serde_json::to_string(&DEFAULT_SCOPES).unwrap();
        assert_eq!(json, r#"["email","full_name"]"#);
    }

    #[test]
    fn test_scope_display_matches_serde() {
        assert_eq!(Scope::Email.to_string(), "email");
        assert_eq!(Scope::FullName.to_string(), "full_name");
    }
}
