//! Common types, record definitions, and errors shared across `securevault` crates.

pub mod error;
pub mod protocol;

pub use error::CipherError;
