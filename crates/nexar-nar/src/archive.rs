//! NAR archive reader.
//!
//! The directory lives at the tail of the file: the final 8 bytes hold an
//! obfuscated directory size and a repeat of the magic, and the directory
//! region itself is XOR-masked and BZip2-compressed.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use bzip2::read::BzDecoder;
use nexar_common::{crc, BinaryReader};

use crate::decode::XorDecoder;
use crate::decompress::LzDecompressor;
use crate::entry::EntryRecord;
use crate::stream::BoundedStream;
use crate::{Error, NarEntry, Result, StoredType};

/// Archive magic, the little-endian reading of `"NAR\0"`.
pub const NAR_MAGIC: u32 = 0x0052_414E;

/// Archive format version.
pub const NAR_VERSION: u32 = 0x0100_0000;

/// Mask applied to the trailer word holding the directory size.
const TRAILER_XOR: u32 = 0x4074_659F;

/// Directory blob version after BZip2 decompression.
const DIRECTORY_VERSION: u32 = 1;

/// XOR mask applied over the compressed directory region.
pub const HEADER_XOR: [u8; 16] = [
    25, 91, 123, 44, 101, 94, 121, 37, 110, 75, 7, 33, 98, 127, 0, 41,
];

/// A NAR archive bound to a seekable byte source.
///
/// The directory is parsed eagerly at open time; payloads are streamed on
/// demand. The source sits behind a mutex held across the whole
/// seek+read+decode sequence of one entry, so extractions from several
/// threads serialize instead of interleaving seeks.
pub struct NarArchive<R> {
    source: Mutex<R>,
    length: u64,
    entries: Vec<NarEntry>,
}

impl NarArchive<File> {
    /// Open an archive file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path).map_err(Error::Io)?)
    }
}

impl<R: Read + Seek> NarArchive<R> {
    /// Read the directory from any seekable source.
    pub fn from_reader(mut source: R) -> Result<Self> {
        let length = source.seek(SeekFrom::End(0)).map_err(Error::Io)?;
        if length < 16 {
            return Err(Error::Truncated {
                needed: 16,
                available: length,
            });
        }

        source.seek(SeekFrom::Start(0)).map_err(Error::Io)?;
        let magic = read_u32(&mut source)?;
        if magic != NAR_MAGIC {
            return Err(Error::InvalidMagic {
                expected: NAR_MAGIC,
                actual: magic,
            });
        }
        let version = read_u32(&mut source)?;
        if version != NAR_VERSION {
            return Err(Error::InvalidVersion {
                expected: NAR_VERSION,
                actual: version,
            });
        }

        source.seek(SeekFrom::Start(length - 4)).map_err(Error::Io)?;
        let tail_magic = read_u32(&mut source)?;
        if tail_magic != NAR_MAGIC {
            return Err(Error::InvalidMagic {
                expected: NAR_MAGIC,
                actual: tail_magic,
            });
        }

        source.seek(SeekFrom::Start(length - 8)).map_err(Error::Io)?;
        let directory_size = u64::from(read_u32(&mut source)? ^ TRAILER_XOR);
        if directory_size + 16 > length {
            return Err(Error::Truncated {
                needed: directory_size + 16,
                available: length,
            });
        }

        source
            .seek(SeekFrom::Start(length - 8 - directory_size))
            .map_err(Error::Io)?;
        let mut masked = vec![0u8; directory_size as usize];
        source.read_exact(&mut masked).map_err(Error::Io)?;
        for (i, byte) in masked.iter_mut().enumerate() {
            *byte ^= HEADER_XOR[i & 15];
        }

        let mut directory = Vec::new();
        BzDecoder::new(masked.as_slice())
            .read_to_end(&mut directory)
            .map_err(Error::Io)?;

        let entries = Self::parse_directory(&directory, length)?;

        Ok(Self {
            source: Mutex::new(source),
            length,
            entries,
        })
    }

    fn parse_directory(directory: &[u8], archive_length: u64) -> Result<Vec<NarEntry>> {
        let mut reader = BinaryReader::new(directory);

        let version = reader.read_u32()?;
        if version != DIRECTORY_VERSION {
            return Err(Error::InvalidVersion {
                expected: DIRECTORY_VERSION,
                actual: version,
            });
        }
        reader.advance(12);

        let count = reader.read_u32()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let code_units = reader.read_u16()?;
            let path = reader.read_utf16(usize::from(code_units))?;
            let record: EntryRecord = reader.read_struct()?;
            let stored_type = StoredType::from_raw(record.stored_type)?;

            if u64::from(record.offset) + u64::from(record.stored_size) > archive_length {
                return Err(Error::OutOfRange("entry payload passes end of archive"));
            }

            entries.push(NarEntry::new(path, &record, stored_type));
        }

        Ok(entries)
    }

    /// Total length of the underlying source in bytes.
    #[inline]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Entries in directory order.
    #[inline]
    pub fn entries(&self) -> &[NarEntry] {
        &self.entries
    }

    /// Number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Find an entry by its archive path.
    pub fn find(&self, path: &str) -> Option<&NarEntry> {
        self.entries.iter().find(|e| e.path() == path)
    }

    /// Extract an entry into a new buffer.
    pub fn extract(&self, entry: &NarEntry) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(entry.extracted_size() as usize);
        self.extract_to(entry, &mut data)?;
        Ok(data)
    }

    /// Extract an entry, writing the decoded payload to `out`.
    ///
    /// Returns the number of bytes written.
    pub fn extract_to<W: Write>(&self, entry: &NarEntry, out: &mut W) -> Result<u64> {
        let mut source = self.lock_source();
        let mut stored = BoundedStream::new(
            &mut *source,
            entry.offset(),
            u64::from(entry.stored_size()),
        )?;

        let written = match entry.stored_type() {
            StoredType::Raw => std::io::copy(&mut stored, out)?,
            StoredType::Encoded => {
                let mut decoded = XorDecoder::new(stored, entry.path());
                std::io::copy(&mut decoded, out)?
            }
            StoredType::EncodedAndCompressed => {
                let decoded = XorDecoder::new(stored, entry.path());
                let mut decompressed =
                    LzDecompressor::new(decoded, u64::from(entry.extracted_size()));
                std::io::copy(&mut decompressed, out)?
            }
        };

        Ok(written)
    }

    /// Check an entry's stored bytes against its directory CRC-32.
    ///
    /// The checksum covers the raw stored payload, before any decoding.
    pub fn verify(&self, entry: &NarEntry) -> Result<()> {
        let mut source = self.lock_source();
        let mut stored = BoundedStream::new(
            &mut *source,
            entry.offset(),
            u64::from(entry.stored_size()),
        )?;

        let mut hasher = crc::Hasher::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = stored.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        let actual = hasher.finalize();
        if actual != entry.checksum() {
            return Err(Error::InvalidChecksum {
                expected: entry.checksum(),
                actual,
            });
        }
        Ok(())
    }

    fn lock_source(&self) -> std::sync::MutexGuard<'_, R> {
        match self.source.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<R> std::fmt::Debug for NarArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarArchive")
            .field("length", &self.length)
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn read_u32<R: Read>(source: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    source.read_exact(&mut bytes).map_err(Error::Io)?;
    Ok(u32::from_le_bytes(bytes))
}
