//! Common error types shared across crates.

use thiserror::Error;

/// Closed error taxonomy of the text cipher.
///
/// Every failure is one of three kinds, and none of them is retried:
/// - [`CipherError::Configuration`] → fatal, surfaces at startup
/// - [`CipherError::InvalidToken`] → permanent rejection of one token
/// - [`CipherError::ExpiredToken`] → permanent rejection of one token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The key is missing or malformed, or another configuration value is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed encoding, wrong version byte, or authentication-tag mismatch.
    ///
    /// Tampering and wrong-key attempts are deliberately indistinguishable.
    #[error("invalid token")]
    InvalidToken,

    /// The token authenticated but is older than the configured time-to-live.
    #[error("token expired")]
    ExpiredToken,
}

impl CipherError {
    /// Short machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CipherError::Configuration(_) => "configuration_error",
            CipherError::InvalidToken => "invalid_token",
            CipherError::ExpiredToken => "expired_token",
        }
    }

    /// Returns `true` when the process cannot operate until configuration is fixed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CipherError::Configuration(_))
    }
}
