//! Cipher configuration loaded from the process environment.
//!
//! Values are read once at startup. A missing or malformed key must stop the
//! process before any note is touched.

use std::collections::HashMap;
use std::time::Duration;

use common::CipherError;
use serde::Deserialize;

/// Cipher configuration.
///
/// | Variable          | Default | Meaning                                  |
/// |-------------------|---------|------------------------------------------|
/// | `FERNET_KEY`      | (none)  | URL-safe base64 32-byte key. **Required.** |
/// | `TOKEN_TTL_SECS`  | unset   | Maximum token age; unset means no expiry |
#[derive(Clone, Default, Deserialize)]
pub struct CipherConfig {
    /// URL-safe base64 encoded key.
    #[serde(default)]
    pub fernet_key: Option<String>,

    /// Maximum accepted token age in seconds.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
}

impl CipherConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Configuration`] if a variable is absent, cannot be
    /// parsed, or fails validation.
    pub fn from_env() -> Result<Self, CipherError> {
        Self::load(config::Environment::default())
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, CipherError> {
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(source: config::Environment) -> Result<Self, CipherError> {
        let cfg = config::Config::builder()
            .add_source(source)
            .build()
            .map_err(|e| {
                CipherError::Configuration(format!(
                    "failed to build configuration from environment: {e}"
                ))
            })?;

        let c: CipherConfig = cfg.try_deserialize().map_err(|e| {
            CipherError::Configuration(format!("failed to deserialise configuration: {e}"))
        })?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<(), CipherError> {
        match self.fernet_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(CipherError::Configuration(
                    "FERNET_KEY is required and must not be empty".into(),
                ))
            }
        }
        if self.token_ttl_secs == Some(0) {
            return Err(CipherError::Configuration(
                "TOKEN_TTL_SECS must be > 0 when set".into(),
            ));
        }
        Ok(())
    }

    /// Configured time-to-live, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.token_ttl_secs.map(Duration::from_secs)
    }
}

impl std::fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherConfig")
            .field("fernet_key", &self.fernet_key.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "cw_0x689RpI-jtRR7oE8h_eQsKImvJapLeSbXpwF4e4=";

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn loads_key_without_ttl() {
        let cfg = CipherConfig::from_vars(vars(&[("FERNET_KEY", KEY)])).unwrap();
        assert_eq!(cfg.fernet_key.as_deref(), Some(KEY));
        assert_eq!(cfg.ttl(), None);
    }

    #[test]
    fn loads_ttl() {
        let cfg = CipherConfig::from_vars(vars(&[
            ("FERNET_KEY", KEY),
            ("TOKEN_TTL_SECS", "3600"),
        ]))
        .unwrap();
        assert_eq!(cfg.ttl(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_missing_key() {
        let err = CipherConfig::from_vars(vars(&[])).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("FERNET_KEY"));
    }

    #[test]
    fn rejects_blank_key() {
        assert!(CipherConfig::from_vars(vars(&[("FERNET_KEY", "   ")])).is_err());
    }

    #[test]
    fn rejects_zero_ttl() {
        let cfg = CipherConfig {
            fernet_key: Some(KEY.into()),
            token_ttl_secs: Some(0),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        let result = CipherConfig::from_vars(vars(&[
            ("FERNET_KEY", KEY),
            ("TOKEN_TTL_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(CipherError::Configuration(_))));
    }

    #[test]
    fn key_redacted_in_debug() {
        let cfg = CipherConfig {
            fernet_key: Some(KEY.into()),
            token_ttl_secs: None,
        };
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(KEY));
    }
}
