use clap::{Parser, Subcommand};

/// securevault - encrypt and decrypt note content under the vault key
#[derive(Debug, Parser)]
#[command(name = "securevault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a freshly generated key suitable for FERNET_KEY
    Keygen,

    /// Encrypt text into a token
    Encrypt {
        /// Text to encrypt (reads stdin when omitted)
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },

    /// Decrypt a token back into text
    Decrypt {
        /// Token to decrypt (reads stdin when omitted)
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Verify a token and print its version and timestamp as JSON
    Inspect {
        /// Token to inspect (reads stdin when omitted)
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Read a note as JSON on stdin and print its sealed form
    Seal,

    /// Read a sealed note as JSON on stdin and print it decrypted
    Open,
}

impl Command {
    /// Whether the command needs `FERNET_KEY` to be configured.
    pub fn needs_key(&self) -> bool {
        !matches!(self, Command::Keygen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encrypt_with_text() {
        let cli = Cli::try_parse_from(["securevault", "encrypt", "hello"]).unwrap();
        assert!(matches!(cli.command, Command::Encrypt { text: Some(ref t) } if t == "hello"));
    }

    #[test]
    fn parses_decrypt_from_stdin() {
        let cli = Cli::try_parse_from(["securevault", "decrypt"]).unwrap();
        assert!(matches!(cli.command, Command::Decrypt { token: None }));
    }

    #[test]
    fn keygen_needs_no_key() {
        let cli = Cli::try_parse_from(["securevault", "keygen"]).unwrap();
        assert!(!cli.command.needs_key());
        let cli = Cli::try_parse_from(["securevault", "open"]).unwrap();
        assert!(cli.command.needs_key());
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(Cli::try_parse_from(["securevault", "rotate"]).is_err());
    }

    #[test]
    fn requires_a_command() {
        assert!(Cli::try_parse_from(["securevault"]).is_err());
    }
}
