//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Token`] - Opaque repository identifier (40 hex chars)
//! - [`Oid`] - Git object identifier (40 hex chars)
//!
//! # Validation
//!
//! Both types enforce validity at construction time. Invalid values cannot
//! be represented, so every downstream consumer can rely on well-formed
//! lowercase hex.
//!
//! # Examples
//!
//! ```
//! use gander::core::types::{Oid, Token};
//!
//! let token = Token::new("a".repeat(40)).unwrap();
//! assert_eq!(token.as_str().len(), 40);
//!
//! // Mixed case is normalized to lowercase
//! let oid = Oid::new("CAFEBABE".repeat(5)).unwrap();
//! assert!(oid.as_str().starts_with("cafebabe"));
//!
//! assert!(Token::new("not-hex").is_err());
//! assert!(Oid::new("abc123").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Length of a rendered 160-bit identifier in hex characters.
const HEX_LEN: usize = 40;

fn validate_hex(value: &str) -> Result<String, String> {
    if value.len() != HEX_LEN {
        return Err(format!("expected {} hex chars, got {}", HEX_LEN, value.len()));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{}' contains non-hex characters", value));
    }
    Ok(value.to_ascii_lowercase())
}

/// An opaque, stable repository identifier.
///
/// Tokens are the lowercase hex rendering of a 160-bit hash of a repository
/// URI's canonical form (see [`crate::resolver::token`]). Two URIs that
/// canonicalize identically always carry the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Create a validated token from a hex string.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidToken`] unless the input is exactly
    /// 40 hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate_hex(&value).map(Token).map_err(TypeError::InvalidToken)
    }

    /// Build a token directly from a 160-bit digest.
    pub(crate) fn from_digest(digest: &[u8; 20]) -> Self {
        Token(hex::encode(digest))
    }

    /// The token as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Token {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Token::new(value)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> String {
        token.0
    }
}

/// A Git object identifier (SHA-1, 40 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a validated object id from a hex string.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidOid`] unless the input is exactly
    /// 40 hex characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        validate_hex(&value).map(Oid).map_err(TypeError::InvalidOid)
    }

    /// The object id as a hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Oid::new(value)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> String {
        oid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_requires_forty_hex_chars() {
        assert!(Token::new("a".repeat(40)).is_ok());
        assert!(Token::new("a".repeat(39)).is_err());
        assert!(Token::new("a".repeat(41)).is_err());
        assert!(Token::new("g".repeat(40)).is_err());
        assert!(Token::new("").is_err());
    }

    #[test]
    fn token_normalizes_case() {
        let token = Token::new("ABCDEF1234".repeat(4)).unwrap();
        assert_eq!(token.as_str(), "abcdef1234".repeat(4));
    }

    #[test]
    fn oid_round_trips_through_serde() {
        let oid = Oid::new("cafebabe".repeat(5)).unwrap();
        let json = serde_json::to_string(&oid).unwrap();
        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(oid, back);
    }

    #[test]
    fn oid_rejects_invalid_serde_input() {
        let result: Result<Oid, _> = serde_json::from_str("\"zz\"");
        assert!(result.is_err());
    }
}
