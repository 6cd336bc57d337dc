//! `securevault`: operator tool entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise structured JSON logging.
//! 4. Build the [`TextCipher`] from `FERNET_KEY` (skipped for `keygen`).
//! 5. Run the command against stdin/stdout.

mod cli;
mod commands;
mod config;
mod telemetry;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use common::{protocol::ErrorResponse, CipherError};
use textcipher::{CipherConfig, TextCipher};
use tracing::{error, info};

use cli::Cli;
use config::Config;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env()?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "securevault starting");

    // -----------------------------------------------------------------------
    // 4. Cipher
    // -----------------------------------------------------------------------
    let cipher = if cli.command.needs_key() {
        let cipher_cfg = CipherConfig::from_env().context("cipher configuration invalid")?;
        let cipher = TextCipher::from_config(&cipher_cfg).context("cipher configuration invalid")?;
        info!(ttl_secs = cipher.ttl().map(|t| t.as_secs()), "cipher initialised");
        Some(cipher)
    } else {
        None
    };

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    commands::dispatch(cli.command, cipher.as_ref(), &mut stdin, &mut stdout)
}

/// Print a failure to stderr: cipher errors as an [`ErrorResponse`] JSON body,
/// anything else as a plain message.
fn report(e: &anyhow::Error) {
    match e.downcast_ref::<CipherError>() {
        Some(ce) => {
            error!(code = ce.code(), "command failed");
            match serde_json::to_string(&ErrorResponse::from(ce)) {
                Ok(body) => eprintln!("{body}"),
                Err(_) => eprintln!("ERROR: {e:#}"),
            }
        }
        None => eprintln!("ERROR: {e:#}"),
    }
}
