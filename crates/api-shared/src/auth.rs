//! Bearer-token authentication.
//!
//! Tokens are static and resolved against a token-to-user map parsed once at
//! startup. The verified [`UserId`] is the only identity the rest of the
//! system ever sees.

use std::collections::HashMap;
use std::env;

use clindex_types::UserId;

/// Why a request could not be authenticated. All variants map to HTTP 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingHeader,
    #[error("Authorization header must be a bearer token")]
    NotBearer,
    #[error("Invalid API token")]
    UnknownToken,
}

/// A malformed entry in the token specification string.
#[derive(Debug, thiserror::Error)]
#[error("Malformed token entry {0:?}, expected token:user")]
pub struct TokenSpecError(String);

/// The token-to-user map behind `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Default)]
pub struct BearerTokens {
    tokens: HashMap<String, UserId>,
}

impl BearerTokens {
    /// Parses a `"token:user,token2:user2"` specification.
    ///
    /// Entries are comma-separated; whitespace around entries, tokens and
    /// user names is ignored; empty entries are skipped. An empty
    /// specification yields a map that authenticates nobody.
    ///
    /// # Errors
    /// Returns `TokenSpecError` for an entry without a `:`, or with an
    /// empty token or user part.
    pub fn from_spec(spec: &str) -> Result<Self, TokenSpecError> {
        let mut tokens = HashMap::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((token, user)) = entry.split_once(':') else {
                return Err(TokenSpecError(entry.to_owned()));
            };
            let token = token.trim();
            if token.is_empty() {
                return Err(TokenSpecError(entry.to_owned()));
            }
            let user = UserId::new(user).map_err(|_| TokenSpecError(entry.to_owned()))?;
            tokens.insert(token.to_owned(), user);
        }
        Ok(Self { tokens })
    }

    /// Reads the specification from `CLINDEX_API_TOKENS`. An unset variable
    /// yields an empty map.
    ///
    /// # Errors
    /// Returns `TokenSpecError` if the variable is set but malformed.
    pub fn from_env() -> Result<Self, TokenSpecError> {
        match env::var("CLINDEX_API_TOKENS") {
            Ok(spec) => Self::from_spec(&spec),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolves an `Authorization` header value to a user.
    ///
    /// # Arguments
    /// * `header` - The raw header value, if the request carried one.
    ///
    /// # Errors
    /// `MissingHeader` when absent, `NotBearer` when the scheme is not
    /// `Bearer`, `UnknownToken` when the token does not resolve.
    pub fn verify(&self, header: Option<&str>) -> Result<UserId, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::NotBearer)?
            .trim();
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::UnknownToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_two_entry_spec() {
        let tokens = BearerTokens::from_spec("secret-1:alice, secret-2:bob").expect("valid spec");
        assert_eq!(
            tokens
                .verify(Some("Bearer secret-1"))
                .expect("token resolves")
                .as_str(),
            "alice"
        );
        assert_eq!(
            tokens
                .verify(Some("Bearer secret-2"))
                .expect("token resolves")
                .as_str(),
            "bob"
        );
    }

    #[test]
    fn empty_spec_authenticates_nobody() {
        let tokens = BearerTokens::from_spec("").expect("empty spec is valid");
        assert!(tokens.is_empty());
        assert!(matches!(
            tokens.verify(Some("Bearer anything")),
            Err(AuthError::UnknownToken)
        ));
    }

    #[test]
    fn entry_without_user_is_rejected() {
        assert!(BearerTokens::from_spec("secret-1").is_err());
        assert!(BearerTokens::from_spec("secret-1:").is_err());
        assert!(BearerTokens::from_spec(":alice").is_err());
    }

    #[test]
    fn missing_header_and_wrong_scheme_are_distinct() {
        let tokens = BearerTokens::from_spec("secret-1:alice").expect("valid spec");
        assert!(matches!(tokens.verify(None), Err(AuthError::MissingHeader)));
        assert!(matches!(
            tokens.verify(Some("Basic secret-1")),
            Err(AuthError::NotBearer)
        ));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let tokens = BearerTokens::from_spec("secret-1:alice").expect("valid spec");
        assert!(matches!(
            tokens.verify(Some("Bearer secret-2")),
            Err(AuthError::UnknownToken)
        ));
    }
}
