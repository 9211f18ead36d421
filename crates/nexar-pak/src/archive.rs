//! PAK container reader.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;
use nexar_crypto::Snow2;

use crate::entry::MAX_PATH_UNITS;
use crate::view::PakView;
use crate::{keys, Error, PakEntry, PakEntryKind, Result};

/// The only supported header version.
pub const PAK_VERSION: u8 = 2;

/// Size of the ciphered region at the head of an `Encrypted` payload.
pub const TOP_ENCRYPTED_SIZE: usize = 0x400;

/// Payload block granularity; entry offsets count these blocks.
pub const BLOCK_SIZE: usize = 1024;

/// On-disk header size.
const HEADER_SIZE: usize = 12;

/// The decrypted 12-byte container header.
#[derive(Debug, Clone, Copy)]
pub struct PakHeader {
    pub checksum: u32,
    pub version: u8,
    pub entry_count: u32,
}

impl PakHeader {
    /// Parse the decrypted header bytes: u32 checksum, u8 version,
    /// u32 entry count, 3 pad bytes.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            checksum: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: bytes[4],
            entry_count: u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
        }
    }

    /// The header is valid when the version matches and the checksum equals
    /// version + entry count.
    pub fn is_valid(&self) -> bool {
        self.version == PAK_VERSION
            && u32::from(self.version).wrapping_add(self.entry_count) == self.checksum
    }
}

enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Source {
    #[inline]
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(vec) => vec,
        }
    }
}

/// A PAK container, fully resident in memory.
///
/// Opening derives the header and entry-table positions and keys from the
/// archive file name, decrypts both regions and parses the entry table.
/// Payloads decrypt on demand in [`unpack`](Self::unpack).
pub struct PakArchive {
    source: Source,
    name: String,
    header: PakHeader,
    entries: Vec<PakEntry>,
    data_offset: usize,
}

impl PakArchive {
    /// Open a container file, mapping it into memory.
    ///
    /// The file name component of `path` feeds the key and offset
    /// derivations, so a renamed container will fail its header checks.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        Self::parse(Source::Mapped(mmap), name)
    }

    /// Read a container from an in-memory buffer under a given name.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::parse(Source::Owned(data), name.into())
    }

    fn parse(source: Source, name: String) -> Result<Self> {
        let data = source.as_slice();

        let header_offset = keys::header_offset(&name);
        if header_offset + HEADER_SIZE > data.len() {
            return Err(Error::Truncated {
                needed: header_offset + HEADER_SIZE,
                available: data.len(),
            });
        }

        let mut header_bytes = [0u8; HEADER_SIZE];
        Snow2::with_key(&keys::header_key(&name)).decrypt(
            &mut header_bytes,
            &data[header_offset..header_offset + HEADER_SIZE],
        );
        let header = PakHeader::parse(&header_bytes);

        if header.version != PAK_VERSION {
            return Err(Error::InvalidVersion {
                expected: PAK_VERSION,
                actual: header.version,
            });
        }
        if !header.is_valid() {
            return Err(Error::InvalidChecksum {
                expected: u32::from(header.version).wrapping_add(header.entry_count),
                actual: header.checksum,
            });
        }

        let entries_offset = keys::entries_offset(&name);
        if entries_offset > data.len() {
            return Err(Error::Truncated {
                needed: entries_offset,
                available: data.len(),
            });
        }

        let mut view = PakView::new(&data[entries_offset..], &keys::entries_key(&name));
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            let path_units = view.read_u32()?;
            if path_units > MAX_PATH_UNITS {
                return Err(Error::OutOfRange("entry path length exceeds bound"));
            }

            let path = view.read_utf16(path_units as usize)?;
            let unknown = view.read_u32()?;
            let kind = PakEntryKind::from_raw(view.read_u32()?)?;
            let offset = view.read_u32()?;
            let original_size = view.read_u32()?;
            let packed_size = view.read_u32()?;
            let base_key = view.read_u32x4()?;

            entries.push(PakEntry {
                path,
                unknown,
                kind,
                offset,
                original_size,
                packed_size,
                base_key,
            });
        }

        let data_offset = align_block(entries_offset + view.consumed());

        Ok(Self {
            source,
            name,
            header,
            entries,
            data_offset,
        })
    }

    /// The file name the container was opened under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decrypted container header.
    #[inline]
    pub fn header(&self) -> &PakHeader {
        &self.header
    }

    /// Entries in table order.
    #[inline]
    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    /// Number of entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Offset of the payload block region.
    #[inline]
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// Find an entry by its container path.
    pub fn find(&self, path: &str) -> Option<&PakEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Unpack an entry's payload.
    pub fn unpack(&self, entry: &PakEntry) -> Result<Vec<u8>> {
        let data = self.source.as_slice();
        let start = self.data_offset + entry.offset as usize * BLOCK_SIZE;
        let length = entry.original_size as usize;

        if start + length > data.len() {
            return Err(Error::Truncated {
                needed: length,
                available: data.len().saturating_sub(start),
            });
        }
        let payload = &data[start..start + length];

        match entry.kind {
            PakEntryKind::Uncompressed => Ok(payload.to_vec()),
            PakEntryKind::Encrypted => {
                // Only the leading block is ciphered; the rest is verbatim.
                let mut out = payload.to_vec();
                let ciphered = length.min(TOP_ENCRYPTED_SIZE);
                let key = keys::data_key(&entry.path, &entry.base_key);
                Snow2::with_key(&key).decrypt_in_place(&mut out[..ciphered]);
                Ok(out)
            }
            PakEntryKind::EncryptedAgain => {
                let key = keys::data_key(&entry.path, &entry.base_key);
                let mut view = PakView::new(payload, &key);
                view.read_bytes(length)
            }
            PakEntryKind::Compressed => {
                Err(Error::UnsupportedType(PakEntryKind::Compressed as u32))
            }
        }
    }

    /// Unpack an entry, writing the payload to `out`.
    pub fn unpack_to<W: Write>(&self, entry: &PakEntry, out: &mut W) -> Result<u64> {
        let payload = self.unpack(entry)?;
        out.write_all(&payload)?;
        Ok(payload.len() as u64)
    }
}

impl std::fmt::Debug for PakArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakArchive")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("data_offset", &self.data_offset)
            .finish()
    }
}

/// Round up to the next payload block boundary.
fn align_block(offset: usize) -> usize {
    (offset + BLOCK_SIZE - 1) & !(BLOCK_SIZE - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "test.pak";

    struct TestEntry {
        path: &'static str,
        kind: u32,
        plain: Vec<u8>,
    }

    fn align4(n: usize) -> usize {
        (n + 3) & !3
    }

    fn encrypt(key: &[u8; 128], plain: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; plain.len()];
        Snow2::with_key(key).decrypt(&mut out, plain);
        out
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Assemble a container image for `NAME`.
    fn build_container(entries: &[TestEntry], checksum_delta: u32) -> Vec<u8> {
        let base_key = [0x01020304u32, 0x05060708, 0x090A0B0C, 0x0D0E0F10];

        // Assign each payload a run of whole blocks.
        let mut block_offsets = Vec::new();
        let mut next_block = 0u32;
        for entry in entries {
            block_offsets.push(next_block);
            next_block += entry.plain.len().div_ceil(BLOCK_SIZE).max(1) as u32;
        }

        let mut table = Vec::new();
        for (entry, &block) in entries.iter().zip(&block_offsets) {
            let units: Vec<u16> = entry.path.encode_utf16().collect();
            push_u32(&mut table, units.len() as u32);
            for unit in units {
                table.extend_from_slice(&unit.to_le_bytes());
            }
            push_u32(&mut table, 0); // unknown
            push_u32(&mut table, entry.kind);
            push_u32(&mut table, block);
            push_u32(&mut table, entry.plain.len() as u32);
            push_u32(&mut table, entry.plain.len() as u32);
            for word in base_key {
                push_u32(&mut table, word);
            }
        }

        let header_offset = keys::header_offset(NAME);
        let entries_offset = keys::entries_offset(NAME);
        let data_offset = align_block(entries_offset + align4(table.len()));

        let mut image = vec![0u8; data_offset + next_block as usize * BLOCK_SIZE];

        let mut header = Vec::new();
        let count = entries.len() as u32;
        push_u32(
            &mut header,
            u32::from(PAK_VERSION) + count + checksum_delta,
        );
        header.push(PAK_VERSION);
        push_u32(&mut header, count);
        header.extend_from_slice(&[0u8; 3]);
        let header_cipher = encrypt(&keys::header_key(NAME), &header);
        image[header_offset..header_offset + HEADER_SIZE].copy_from_slice(&header_cipher);

        let table_cipher = encrypt(&keys::entries_key(NAME), &table);
        image[entries_offset..entries_offset + table_cipher.len()].copy_from_slice(&table_cipher);

        for (entry, &block) in entries.iter().zip(&block_offsets) {
            let key = keys::data_key(entry.path, &base_key);
            let stored = match entry.kind {
                2 => {
                    let mut buf = entry.plain.clone();
                    let ciphered = buf.len().min(TOP_ENCRYPTED_SIZE);
                    Snow2::with_key(&key).decrypt_in_place(&mut buf[..ciphered]);
                    buf
                }
                4 => encrypt(&key, &entry.plain),
                _ => entry.plain.clone(),
            };
            let start = data_offset + block as usize * BLOCK_SIZE;
            image[start..start + stored.len()].copy_from_slice(&stored);
        }

        image
    }

    fn sample_entries() -> Vec<TestEntry> {
        vec![
            TestEntry {
                path: "ui/logo.tga",
                kind: 0,
                plain: (0..300u32).map(|i| i as u8).collect(),
            },
            TestEntry {
                path: "models/weapon.mdl",
                kind: 2,
                plain: (0..900u32).map(|i| (i * 7) as u8).collect(),
            },
            TestEntry {
                path: "scripts/config.txt",
                kind: 4,
                plain: b"alias buy \"menuselect 1\"\n".repeat(10),
            },
        ]
    }

    #[test]
    fn test_header_round_trip() {
        let image = build_container(&sample_entries(), 0);
        let archive = PakArchive::from_bytes(NAME, image).unwrap();

        assert_eq!(archive.header().version, PAK_VERSION);
        assert_eq!(archive.header().entry_count, 3);
        assert!(archive.header().is_valid());
    }

    #[test]
    fn test_header_checksum_relation() {
        let good = PakHeader {
            checksum: 7,
            version: 2,
            entry_count: 5,
        };
        assert!(good.is_valid());

        let bad = PakHeader {
            checksum: 6,
            ..good
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_rejects_checksum_mismatch() {
        let image = build_container(&sample_entries(), 1);
        assert!(matches!(
            PakArchive::from_bytes(NAME, image),
            Err(Error::InvalidChecksum { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_name() {
        // Derivations depend on the name; a renamed container decrypts to
        // garbage and fails validation.
        let image = build_container(&sample_entries(), 0);
        assert!(PakArchive::from_bytes("renamed.pak", image).is_err());
    }

    #[test]
    fn test_lists_entries_in_table_order() {
        let image = build_container(&sample_entries(), 0);
        let archive = PakArchive::from_bytes(NAME, image).unwrap();

        let paths: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["ui/logo.tga", "models/weapon.mdl", "scripts/config.txt"]
        );
        assert_eq!(
            archive.entries()[1].kind,
            PakEntryKind::Encrypted
        );
    }

    #[test]
    fn test_unpacks_all_kinds() {
        let entries = sample_entries();
        let image = build_container(&entries, 0);
        let archive = PakArchive::from_bytes(NAME, image).unwrap();

        for (entry, expected) in archive.entries().iter().zip(&entries) {
            let data = archive.unpack(entry).unwrap();
            assert_eq!(data, expected.plain, "mismatch for {}", entry.path);
        }
    }

    #[test]
    fn test_encrypted_kind_large_payload_tail_is_verbatim() {
        // Payloads past the top block are stored in the clear for kind 2.
        let large = TestEntry {
            path: "sound/hit.wav",
            kind: 2,
            plain: (0..2000u32).map(|i| (i % 251) as u8).collect(),
        };
        let expected = large.plain.clone();
        let image = build_container(&[large], 0);
        let archive = PakArchive::from_bytes(NAME, image).unwrap();

        let entry = &archive.entries()[0];
        let data = archive.unpack(entry).unwrap();
        assert_eq!(data, expected);

        // The stored tail equals the plaintext tail.
        let start = archive.data_offset() + entry.offset as usize * BLOCK_SIZE;
        let raw = &archive.source.as_slice()[start..start + expected.len()];
        assert_eq!(&raw[TOP_ENCRYPTED_SIZE..], &expected[TOP_ENCRYPTED_SIZE..]);
        assert_ne!(&raw[..16], &expected[..16]);
    }

    #[test]
    fn test_compressed_kind_is_unsupported() {
        let entries = vec![TestEntry {
            path: "maps/de_dust.bsp",
            kind: 1,
            plain: vec![0xAB; 100],
        }];
        let image = build_container(&entries, 0);
        let archive = PakArchive::from_bytes(NAME, image).unwrap();

        assert!(matches!(
            archive.unpack(&archive.entries()[0]),
            Err(Error::UnsupportedType(1))
        ));
    }

    #[test]
    fn test_rejects_oversized_path_length() {
        // Hand-build a table whose first entry claims 0x4001 path units.
        let mut table = Vec::new();
        push_u32(&mut table, 0x4001);

        let header_offset = keys::header_offset(NAME);
        let entries_offset = keys::entries_offset(NAME);
        let mut image = vec![0u8; entries_offset + 64];

        let mut header = Vec::new();
        push_u32(&mut header, u32::from(PAK_VERSION) + 1);
        header.push(PAK_VERSION);
        push_u32(&mut header, 1);
        header.extend_from_slice(&[0u8; 3]);
        let header_cipher = encrypt(&keys::header_key(NAME), &header);
        image[header_offset..header_offset + HEADER_SIZE].copy_from_slice(&header_cipher);

        let table_cipher = encrypt(&keys::entries_key(NAME), &table);
        image[entries_offset..entries_offset + table_cipher.len()].copy_from_slice(&table_cipher);

        assert!(matches!(
            PakArchive::from_bytes(NAME, image),
            Err(Error::OutOfRange(_))
        ));
    }
}
