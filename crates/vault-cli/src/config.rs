//! Configuration loading and validation for the `securevault` tool.
//!
//! Cipher settings (`FERNET_KEY`, `TOKEN_TTL_SECS`) are loaded separately by
//! [`textcipher::CipherConfig`], and only for commands that need a key.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tool-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build securevault configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise securevault configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty when set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_rejects_blank_log_level() {
        let cfg = Config {
            log_level: "  ".into(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_filter_directives() {
        let cfg = Config {
            log_level: "warn,textcipher=debug".into(),
        };
        assert!(cfg.validate().is_ok());
    }
}
