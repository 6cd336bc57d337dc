//! Record types exchanged between the cipher layer and its callers.
//!
//! These types are serialised as JSON, both when persisted by the record
//! layer and on the operator CLI's stdin/stdout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CipherError;

// ---------------------------------------------------------------------------
// Notes at rest
// ---------------------------------------------------------------------------

/// Persisted form of a note.
///
/// Identical to the editable note except that `content` holds an opaque
/// token instead of the plaintext body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedNote {
    /// Note identifier.
    pub id: Uuid,
    /// Note title, stored in the clear.
    pub title: String,
    /// Encrypted note body.
    pub content: String,
    /// Comma-separated tags, stored in the clear.
    #[serde(default)]
    pub tags: String,
}

// ---------------------------------------------------------------------------
// Token inspection
// ---------------------------------------------------------------------------

/// Authenticated metadata of a token, reported without decrypting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Format version byte.
    pub version: u8,
    /// Creation time in seconds since the UNIX epoch.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error body emitted when a cipher operation fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"invalid_token"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&CipherError> for ErrorResponse {
    fn from(e: &CipherError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}
