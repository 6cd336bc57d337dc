//! [`TextCipher`]: encrypt note text into tokens and back.
//!
//! **Construction:** AES-128-CBC with a random IV for confidentiality and
//! HMAC-SHA256 (encrypt-then-MAC) over version, timestamp, IV and ciphertext
//! for integrity. The tag is verified in constant time before any decryption
//! is attempted, so a token that fails authentication never reaches the
//! block cipher.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::{protocol::TokenInfo, CipherError};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use tracing::debug;

use crate::config::CipherConfig;
use crate::key::CipherKey;
use crate::token::{Token, IV_LEN, TAG_LEN, VERSION};

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// How far in the future a token's timestamp may lie when a TTL is enforced.
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Symmetric, authenticated text cipher bound to a single key.
///
/// Cheap to clone; clones share the same immutable key. Safe to use from
/// many threads at once.
#[derive(Debug, Clone)]
pub struct TextCipher {
    key: Arc<CipherKey>,
    ttl: Option<Duration>,
}

impl TextCipher {
    /// Create a cipher that never expires tokens.
    pub fn new(key: CipherKey) -> Self {
        Self {
            key: Arc::new(key),
            ttl: None,
        }
    }

    /// Create a cipher that rejects tokens older than `ttl`.
    pub fn with_ttl(key: CipherKey, ttl: Duration) -> Self {
        Self {
            key: Arc::new(key),
            ttl: Some(ttl),
        }
    }

    /// Build a cipher from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the key is absent or malformed,
    /// or the TTL is zero.
    pub fn from_config(cfg: &CipherConfig) -> Result<Self, CipherError> {
        cfg.validate()?;
        let encoded = cfg
            .fernet_key
            .as_deref()
            .ok_or_else(|| CipherError::Configuration("FERNET_KEY is required".into()))?;
        let key = CipherKey::from_base64(encoded)?;
        Ok(match cfg.ttl() {
            Some(ttl) => Self::with_ttl(key, ttl),
            None => Self::new(key),
        })
    }

    /// The enforced time-to-live, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Encrypt `plaintext` into a URL-safe token stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if the system clock reads
    /// earlier than the UNIX epoch.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        self.encrypt_at(plaintext, unix_now()?)
    }

    /// Encrypt `plaintext` into a token stamped with `timestamp`.
    pub fn encrypt_at(&self, plaintext: &str, timestamp: u64) -> Result<String, CipherError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        Ok(self.seal(plaintext.as_bytes(), timestamp, iv)?.encode())
    }

    /// Decrypt a token produced by [`TextCipher::encrypt`] under the same key.
    ///
    /// # Errors
    ///
    /// - [`CipherError::InvalidToken`] if the token is malformed, tampered with,
    ///   or was produced under another key.
    /// - [`CipherError::ExpiredToken`] if a TTL is enforced and the token is
    ///   older than it.
    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        self.decrypt_at(token, unix_now()?)
    }

    /// Decrypt a token, evaluating the TTL against `now` instead of the clock.
    pub fn decrypt_at(&self, token: &str, now: u64) -> Result<String, CipherError> {
        let token = self.verified(token)?;
        self.check_age(&token, now)?;

        let plaintext = Aes128CbcDec::new(&self.key.encryption_key().into(), &token.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&token.ciphertext)
            .map_err(|_| {
                debug!(reason = "padding", "token rejected");
                CipherError::InvalidToken
            })?;

        String::from_utf8(plaintext).map_err(|_| {
            debug!(reason = "utf-8", "token rejected");
            CipherError::InvalidToken
        })
    }

    /// Authenticate a token and report its metadata without decrypting it.
    ///
    /// The TTL is not applied.
    pub fn inspect(&self, token: &str) -> Result<TokenInfo, CipherError> {
        let token = self.verified(token)?;
        Ok(TokenInfo {
            version: VERSION,
            timestamp: token.timestamp,
        })
    }

    /// Authenticate a token and return its creation time in UNIX seconds.
    pub fn extract_timestamp(&self, token: &str) -> Result<u64, CipherError> {
        self.inspect(token).map(|info| info.timestamp)
    }

    fn seal(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        iv: [u8; IV_LEN],
    ) -> Result<Token, CipherError> {
        let ciphertext = Aes128CbcEnc::new(&self.key.encryption_key().into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        let mut token = Token {
            timestamp,
            iv,
            ciphertext,
            tag: [0u8; TAG_LEN],
        };
        let mut mac = self.mac()?;
        mac.update(&token.signed_bytes());
        token.tag.copy_from_slice(&mac.finalize().into_bytes());
        Ok(token)
    }

    fn verified(&self, token: &str) -> Result<Token, CipherError> {
        let token = Token::decode(token)?;
        let mut mac = self.mac()?;
        mac.update(&token.signed_bytes());
        mac.verify_slice(&token.tag).map_err(|_| {
            debug!(reason = "tag mismatch", "token rejected");
            CipherError::InvalidToken
        })?;
        Ok(token)
    }

    fn check_age(&self, token: &Token, now: u64) -> Result<(), CipherError> {
        let Some(ttl) = self.ttl else {
            return Ok(());
        };
        if token.timestamp.saturating_add(ttl.as_secs()) < now {
            debug!(timestamp = token.timestamp, now, "token expired");
            return Err(CipherError::ExpiredToken);
        }
        if now.saturating_add(MAX_CLOCK_SKEW_SECS) < token.timestamp {
            debug!(reason = "future timestamp", "token rejected");
            return Err(CipherError::InvalidToken);
        }
        Ok(())
    }

    fn mac(&self) -> Result<HmacSha256, CipherError> {
        <HmacSha256 as Mac>::new_from_slice(self.key.signing_key())
            .map_err(|_| CipherError::Configuration("invalid signing key length".into()))
    }
}

fn unix_now() -> Result<u64, CipherError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| CipherError::Configuration("system clock is before the UNIX epoch".into()))
}
