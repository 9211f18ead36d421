//! Error types for the cipher crate.

use thiserror::Error;

/// Errors surfaced by cipher setup.
#[derive(Debug, Error)]
pub enum Error {
    /// Key length does not match the configured cipher level.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    /// The requested cipher configuration is not supported.
    #[error("unsupported cipher configuration: {0}")]
    Unsupported(&'static str),
}

/// Result type for cipher operations.
pub type Result<T> = std::result::Result<T, Error>;
