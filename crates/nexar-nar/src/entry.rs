//! NAR archive entry.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// How an entry's payload is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredType {
    /// Verbatim bytes.
    Raw,
    /// Positional XOR encoding.
    Encoded,
    /// Positional XOR encoding over an LZ-compressed payload.
    EncodedAndCompressed,
}

impl StoredType {
    pub(crate) fn from_raw(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Encoded),
            2 => Ok(Self::EncodedAndCompressed),
            other => Err(Error::UnsupportedType(other)),
        }
    }
}

/// Fixed tail of a directory entry record, following the UTF-16 path.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub(crate) struct EntryRecord {
    pub stored_type: u32,
    pub offset: u32,
    pub stored_size: u32,
    pub extracted_size: u32,
    pub last_modified: u32,
    pub checksum: u32,
}

/// An entry (file) within a NAR archive.
///
/// This holds directory metadata only; use [`NarArchive::extract`] to get
/// the file contents.
///
/// [`NarArchive::extract`]: crate::NarArchive::extract
#[derive(Debug, Clone)]
pub struct NarEntry {
    path: String,
    stored_type: StoredType,
    offset: u64,
    stored_size: u32,
    extracted_size: u32,
    last_modified: u32,
    checksum: u32,
}

impl NarEntry {
    pub(crate) fn new(path: String, record: &EntryRecord, stored_type: StoredType) -> Self {
        Self {
            path,
            stored_type,
            offset: u64::from(record.offset),
            stored_size: record.stored_size,
            extracted_size: record.extracted_size,
            last_modified: record.last_modified,
            checksum: record.checksum,
        }
    }

    /// Entry path within the archive.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// How the payload is stored.
    #[inline]
    pub fn stored_type(&self) -> StoredType {
        self.stored_type
    }

    /// Absolute payload offset in the archive.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Payload size as stored on disk.
    #[inline]
    pub fn stored_size(&self) -> u32 {
        self.stored_size
    }

    /// Payload size after decoding and decompression.
    #[inline]
    pub fn extracted_size(&self) -> u32 {
        self.extracted_size
    }

    /// CRC-32 of the raw stored bytes.
    #[inline]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Last modification time as seconds since the Unix epoch.
    #[inline]
    pub fn last_modified_secs(&self) -> u32 {
        self.last_modified
    }

    /// Last modification time as a [`SystemTime`].
    pub fn last_modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(u64::from(self.last_modified))
    }

    /// Relative output path for extraction, with separators normalized.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.path.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EntryRecord {
        EntryRecord {
            stored_type: 0,
            offset: 0x100,
            stored_size: 64,
            extracted_size: 64,
            last_modified: 1_234_567_890,
            checksum: 0xDEADBEEF,
        }
    }

    #[test]
    fn test_stored_type_parsing() {
        assert_eq!(StoredType::from_raw(0).unwrap(), StoredType::Raw);
        assert_eq!(StoredType::from_raw(1).unwrap(), StoredType::Encoded);
        assert_eq!(
            StoredType::from_raw(2).unwrap(),
            StoredType::EncodedAndCompressed
        );
        assert!(matches!(
            StoredType::from_raw(3),
            Err(Error::UnsupportedType(3))
        ));
    }

    #[test]
    fn test_last_modified() {
        let entry = NarEntry::new("a.txt".into(), &record(), StoredType::Raw);
        assert_eq!(
            entry.last_modified(),
            UNIX_EPOCH + Duration::from_secs(1_234_567_890)
        );
    }

    #[test]
    fn test_output_path_normalization() {
        let entry = NarEntry::new(r"models\player.mdl".into(), &record(), StoredType::Raw);
        assert_eq!(entry.output_path(), PathBuf::from("models/player.mdl"));
    }
}
