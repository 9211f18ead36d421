//! Error types for the PAK crate.

use thiserror::Error;

/// Errors that can occur when reading PAK containers.
#[derive(Debug, Error)]
pub enum Error {
    /// The header version is not the supported one.
    #[error("invalid PAK version: expected {expected}, got {actual}")]
    InvalidVersion { expected: u8, actual: u8 },

    /// The header checksum relation does not hold.
    #[error("invalid PAK header checksum: expected {expected}, got {actual}")]
    InvalidChecksum { expected: u32, actual: u32 },

    /// A read requested more bytes than the view or buffer can provide.
    #[error("truncated container: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },

    /// A length or count exceeds its documented bound.
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    /// The entry kind is unknown, or its decoding scheme is unrealized.
    #[error("unsupported entry kind: {0}")]
    UnsupportedType(u32),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] nexar_common::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for PAK operations.
pub type Result<T> = std::result::Result<T, Error>;
