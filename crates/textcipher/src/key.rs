//! [`CipherKey`]: the process-wide secret behind every token.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use common::CipherError;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use crate::token::URL_SAFE_LENIENT;

/// Byte length of a key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of each half of the key.
const HALF_LEN: usize = KEY_LEN / 2;

/// Errors produced while parsing key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The configured value is not URL-safe base64.
    #[error("key is not valid URL-safe base64")]
    InvalidEncoding,

    /// The decoded key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

impl From<KeyError> for CipherError {
    fn from(e: KeyError) -> Self {
        CipherError::Configuration(e.to_string())
    }
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// The first half signs tokens (HMAC-SHA256), the second half encrypts them
/// (AES-128-CBC). When this type is dropped the memory is overwritten with
/// zeroes.
pub struct CipherKey(Box<[u8; KEY_LEN]>);

impl CipherKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_bytes(key_bytes: &[u8]) -> Result<Self, KeyError> {
        if key_bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(key_bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        Ok(Self(buf))
    }

    /// Parse a key from its URL-safe base64 configuration form.
    ///
    /// Surrounding whitespace is ignored; padding is optional.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let mut decoded = URL_SAFE_LENIENT
            .decode(encoded.trim())
            .map_err(|_| KeyError::InvalidEncoding)?;
        let key = Self::from_bytes(&decoded);
        decoded.iter_mut().for_each(|b| *b = 0);
        key
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = Box::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut buf[..]);
        Self(buf)
    }

    /// Render the key in the padded URL-safe base64 form expected by `FERNET_KEY`.
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(&self.0[..])
    }

    pub(crate) fn signing_key(&self) -> &[u8] {
        &self.0[..HALF_LEN]
    }

    pub(crate) fn encryption_key(&self) -> [u8; HALF_LEN] {
        let mut out = [0u8; HALF_LEN];
        out.copy_from_slice(&self.0[HALF_LEN..]);
        out
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("CipherKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE_KEY: &str = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";

    #[test]
    fn parses_padded_and_unpadded() {
        let padded = CipherKey::from_base64(REFERENCE_KEY).unwrap();
        let unpadded = CipherKey::from_base64(REFERENCE_KEY.trim_end_matches('=')).unwrap();
        assert_eq!(padded.signing_key(), unpadded.signing_key());
        assert_eq!(padded.encryption_key(), unpadded.encryption_key());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let key = CipherKey::from_base64(&format!("  {REFERENCE_KEY}\n")).unwrap();
        assert_eq!(key.to_base64(), REFERENCE_KEY);
    }

    #[test]
    fn rejects_wrong_length() {
        let short = URL_SAFE.encode([0u8; 16]);
        assert!(matches!(
            CipherKey::from_base64(&short),
            Err(KeyError::InvalidLength(16))
        ));
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            CipherKey::from_base64("not/valid+base64!"),
            Err(KeyError::InvalidEncoding)
        ));
    }

    #[test]
    fn halves_split_the_key() {
        let bytes: Vec<u8> = (0..KEY_LEN as u8).collect();
        let key = CipherKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.signing_key(), &bytes[..16]);
        assert_eq!(&key.encryption_key()[..], &bytes[16..]);
    }

    #[test]
    fn generated_keys_differ_and_round_trip() {
        let a = CipherKey::generate();
        let b = CipherKey::generate();
        assert_ne!(a.to_base64(), b.to_base64());
        let parsed = CipherKey::from_base64(&a.to_base64()).unwrap();
        assert_eq!(parsed.to_base64(), a.to_base64());
    }

    #[test]
    fn key_redacted_in_debug() {
        let key = CipherKey::generate();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(&key.to_base64()));
    }

    #[test]
    fn key_error_maps_to_configuration() {
        let e: CipherError = KeyError::InvalidLength(3).into();
        assert!(e.is_fatal());
    }
}
