//! Positional XOR decoding for NAR entry payloads.

use std::io::{self, Read, Seek};

/// Length of the derived XOR mask.
const MASK_LEN: usize = 16;

/// Python-2-style string hash over the entry path bytes.
///
/// Must wrap at 32 bits; the multiplier folds each byte before the length is
/// XORed in at the end.
fn path_hash(data: &[u8]) -> u32 {
    let mut h = 0u32;
    for &b in data {
        h = h.wrapping_mul(1_000_003) ^ u32::from(b);
    }
    h ^ data.len() as u32
}

/// Expand a path hash into the 16-byte XOR mask through an LCG.
fn derive_mask(path: &str) -> [u8; MASK_LEN] {
    let mut seed = path_hash(path.as_bytes());
    std::array::from_fn(|_| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seed as u8
    })
}

/// Decodes a NAR `Encoded` payload by XORing each byte with a mask indexed
/// by the byte's position in the wrapped stream.
///
/// The mask index comes from the underlying stream position at the start of
/// each read, so the decoder carries no state of its own: seeking the inner
/// stream and re-reading decodes correctly, and applying the decoder twice
/// at the same position is the identity.
pub struct XorDecoder<R> {
    inner: R,
    mask: [u8; MASK_LEN],
}

impl<R: Read + Seek> XorDecoder<R> {
    /// Wrap `inner`, deriving the mask from the entry path.
    pub fn new(inner: R, path: &str) -> Self {
        Self {
            inner,
            mask: derive_mask(path),
        }
    }
}

impl<R: Read + Seek> Read for XorDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.inner.stream_position()?;
        let n = self.inner.read(buf)?;
        for (i, byte) in buf[..n].iter_mut().enumerate() {
            *byte ^= self.mask[(position as usize + i) % MASK_LEN];
        }
        Ok(n)
    }
}
