//! CRC-32 hashing utilities.
//!
//! NAR archives store an IEEE 802.3 CRC-32 for every entry, computed over
//! the raw stored bytes (before decoding or decompression).

/// Streaming CRC-32 hasher, re-exported for chunked verification.
pub use crc32fast::Hasher;

/// Compute the CRC-32 of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(hash_bytes(b""), 0);
        // The standard CRC-32 check value
        assert_eq!(hash_bytes(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut hasher = Hasher::new();
        for chunk in data.chunks(7) {
            hasher.update(chunk);
        }
        assert_eq!(hasher.finalize(), hash_bytes(data));
    }
}
