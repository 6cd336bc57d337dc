//! Authenticated, URL-safe encryption of short text payloads.
//!
//! This crate is intentionally free of HTTP and storage dependencies. It
//! protects note bodies at rest under a single static key supplied by the
//! environment.
//!
//! # Token format
//!
//! Tokens are Fernet-compatible, so content written by earlier deployments
//! of the vault decrypts unchanged. See [`token`] for the byte layout.
//!
//! # Security invariants
//!
//! - Key material is **never** logged, printed in `Debug` output, or written
//!   alongside ciphertext.
//! - A token that fails authentication is never decrypted.

pub mod cipher;
pub mod config;
pub mod key;
pub mod notes;
pub mod token;

pub use cipher::TextCipher;
pub use common::CipherError;
pub use config::CipherConfig;
pub use key::{CipherKey, KEY_LEN};
pub use notes::{Note, NoteContent, NoteSealer, OpenedNote};
