use thiserror::Error;

use crate::domain::der::DerError;
use crate::domain::integrity::IntegrityError;

/// Errors surfaced by key fetching and signing.
///
/// Nothing is retried below this type: every failure reaches the caller,
/// and no key or signature material is returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizerError {
    /// Bytes that should be DER (or PEM-armored DER) do not parse.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
    /// DER parsed, but not into the expected key or signature shape.
    #[error("unexpected structure: {0}")]
    UnexpectedStructure(String),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// Caller supplied hex (message, address, key) is invalid.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("key management response has no {0}")]
    MissingKeyMaterial(&'static str),
    #[error("key management call failed: {0}")]
    Remote(String),
}

impl From<DerError> for AuthorizerError {
    fn from(error: DerError) -> Self {
        AuthorizerError::MalformedEncoding(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthorizerError>;
