//! PAK container entry.

use crate::{Error, Result};

/// Upper bound on an entry path length, in UTF-16 code units.
pub const MAX_PATH_UNITS: u32 = 0x4000;

/// How an entry's payload is processed on extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PakEntryKind {
    /// Verbatim bytes.
    Uncompressed = 0,
    /// Compressed payload. The compression scheme was never realized in any
    /// known client, so unpacking surfaces a typed error.
    Compressed = 1,
    /// Only the leading block of the payload is ciphered.
    Encrypted = 2,
    /// The whole payload is ciphered.
    EncryptedAgain = 4,
}

impl PakEntryKind {
    pub(crate) fn from_raw(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Uncompressed),
            1 => Ok(Self::Compressed),
            2 => Ok(Self::Encrypted),
            4 => Ok(Self::EncryptedAgain),
            other => Err(Error::UnsupportedType(other)),
        }
    }
}

/// An entry (file) within a PAK container.
#[derive(Debug, Clone)]
pub struct PakEntry {
    /// File path within the container.
    pub path: String,
    /// Meaning unknown; carried through from the entry table.
    pub unknown: u32,
    /// Payload processing kind.
    pub kind: PakEntryKind,
    /// Payload position in 1024-byte blocks past the data origin.
    pub offset: u32,
    /// Payload size after unpacking.
    pub original_size: u32,
    /// Payload size as stored.
    pub packed_size: u32,
    /// Per-entry 128-bit key material mixed into the payload cipher key.
    pub base_key: [u32; 4],
}
