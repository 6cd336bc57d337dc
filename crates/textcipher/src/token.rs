//! Token wire format.
//!
//! ```text
//! base64url( version | timestamp | iv | ciphertext | tag )
//!
//! version    1 byte    0x80
//! timestamp  8 bytes   big-endian seconds since the UNIX epoch
//! iv         16 bytes  random per token
//! ciphertext N*16      AES-128-CBC, PKCS#7 padded, N >= 1
//! tag        32 bytes  HMAC-SHA256 over everything before it
//! ```
//!
//! Parsing here is purely structural. Authentication lives in
//! [`crate::cipher`].

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose},
    Engine as _,
};
use common::CipherError;
use tracing::debug;

/// Format version byte that leads every token.
pub const VERSION: u8 = 0x80;

/// Byte length of the initialisation vector.
pub const IV_LEN: usize = 16;

/// Byte length of the HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// AES block size.
pub const BLOCK_LEN: usize = 16;

const TIMESTAMP_LEN: usize = 8;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + IV_LEN;

/// Smallest possible decoded token: header, one cipher block, tag.
pub const MIN_TOKEN_LEN: usize = HEADER_LEN + BLOCK_LEN + TAG_LEN;

/// URL-safe base64 that decodes with or without `=` padding.
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A parsed token whose tag has not yet been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Creation time, seconds since the UNIX epoch.
    pub timestamp: u64,
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Padded ciphertext, a whole number of blocks.
    pub ciphertext: Vec<u8>,
    /// HMAC-SHA256 tag over [`Token::signed_bytes`].
    pub tag: [u8; TAG_LEN],
}

impl Token {
    /// The bytes covered by the tag: `version | timestamp | iv | ciphertext`.
    pub fn signed_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        buf.push(VERSION);
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Encode this token to its canonical padded base64url string.
    pub fn encode(&self) -> String {
        let mut raw = self.signed_bytes();
        raw.extend_from_slice(&self.tag);
        general_purpose::URL_SAFE.encode(raw)
    }

    /// Parse a token string back into its fields.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidToken`] if the string is not base64url,
    /// is too short, carries the wrong version byte, or its ciphertext is not
    /// a whole number of blocks.
    pub fn decode(s: &str) -> Result<Self, CipherError> {
        let raw = URL_SAFE_LENIENT.decode(s).map_err(|_| {
            debug!(reason = "encoding", "token rejected");
            CipherError::InvalidToken
        })?;
        if raw.len() < MIN_TOKEN_LEN {
            debug!(reason = "length", len = raw.len(), "token rejected");
            return Err(CipherError::InvalidToken);
        }
        if raw[0] != VERSION {
            debug!(reason = "version", version = raw[0], "token rejected");
            return Err(CipherError::InvalidToken);
        }

        let (body, tag_bytes) = raw.split_at(raw.len() - TAG_LEN);
        let ciphertext = &body[HEADER_LEN..];
        if ciphertext.len() % BLOCK_LEN != 0 {
            debug!(reason = "block alignment", "token rejected");
            return Err(CipherError::InvalidToken);
        }

        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&body[1..1 + TIMESTAMP_LEN]);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&body[1 + TIMESTAMP_LEN..HEADER_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            timestamp: u64::from_be_bytes(ts),
            iv,
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }
}
