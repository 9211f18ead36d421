//! Error types for the NAR crate.

use std::io;

use thiserror::Error;

/// Errors that can occur when reading NAR archives.
#[derive(Debug, Error)]
pub enum Error {
    /// The file does not carry the NAR magic.
    #[error("invalid NAR magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// The archive or directory version is not supported.
    #[error("invalid NAR version: expected {expected:#010x}, got {actual:#010x}")]
    InvalidVersion { expected: u32, actual: u32 },

    /// An entry's stored CRC-32 does not match its payload.
    #[error("checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    InvalidChecksum { expected: u32, actual: u32 },

    /// A read requested more bytes than the stream can provide.
    #[error("truncated archive: needed {needed} bytes but only {available} available")]
    Truncated { needed: u64, available: u64 },

    /// A size or offset exceeds its documented bound.
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    /// The LZ token stream is malformed.
    #[error("malformed token stream: {0}")]
    MalformedTokenStream(&'static str),

    /// An entry carries an unknown stored-type.
    #[error("unsupported stored-type: {0}")]
    UnsupportedType(u32),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] nexar_common::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(io::Error),
}

// The decode/decompress pipeline runs behind `std::io::Read`, so typed
// errors travel wrapped in `io::Error`. Unwrap them at the crate boundary.
impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.downcast::<Error>() {
            Ok(inner) => inner,
            Err(e) => Self::Io(e),
        }
    }
}

impl Error {
    /// Wrap this error for transport through an `io::Read` chain.
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

/// Result type for NAR operations.
pub type Result<T> = std::result::Result<T, Error>;
