//! Token wrappers and the stored-token validity predicate.
//!
//! Persisted token entries can be corrupted by earlier client versions that
//! wrote the literal strings `"undefined"` or `"null"`, or truncated values.
//! Anything failing the predicate is treated as an absent token: it never
//! reaches an `Authorization` header and never counts toward an
//! authenticated session.

/// Minimum byte length of a plausible token. Anything shorter is treated
/// as corrupted persisted state.
const MIN_TOKEN_LENGTH: usize = 11;

/// Returns whether a stored token string looks like a usable token.
#[must_use]
pub fn looks_like_token(value: &str) -> bool {
    value != "undefined" && value != "null" && value.len() >= MIN_TOKEN_LENGTH
}

/// Bearer token attached to authenticated API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token string, returning `None` when the value fails the
    /// validity predicate and must be treated as absent.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        looks_like_token(value).then(|| Self(value.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Long-lived token exchanged for replacement access tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wraps a refresh token string, returning `None` when the value fails
    /// the validity predicate and must be treated as absent.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        looks_like_token(value).then(|| Self(value.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefreshToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
