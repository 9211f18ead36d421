//! Ciphered view over a PAK region.

use nexar_crypto::Snow2;

use crate::{Error, Result};

/// Sequential typed reader over a SNOW-encrypted byte region.
///
/// The cipher consumes ciphertext in 4-byte-aligned steps. When a typed
/// read needs fewer bytes than the aligned amount, the decrypted slack
/// (at most 3 bytes) is buffered and satisfies the start of the next read,
/// keeping plaintext and keystream in lockstep with the on-disk layout.
///
/// Reads must be issued in the order the region was written; a view is
/// bound to one region and one keystream, so re-keying or reusing it for a
/// different slice would desynchronize.
pub struct PakView<'a> {
    data: &'a [u8],
    position: usize,
    cipher: Snow2,
    remainder: [u8; 4],
    remainder_start: usize,
    remainder_len: usize,
}

impl<'a> PakView<'a> {
    /// Create a view over `data`, keying a fresh cipher.
    pub fn new(data: &'a [u8], key: &[u8; 128]) -> Self {
        Self {
            data,
            position: 0,
            cipher: Snow2::with_key(key),
            remainder: [0; 4],
            remainder_start: 0,
            remainder_len: 0,
        }
    }

    /// Ciphertext bytes consumed so far, including buffered slack.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// Decrypt exactly `out.len()` plaintext bytes.
    fn read_into(&mut self, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < out.len() && self.remainder_len > 0 {
            out[filled] = self.remainder[self.remainder_start];
            self.remainder_start += 1;
            self.remainder_len -= 1;
            filled += 1;
        }

        let needed = out.len() - filled;
        if needed == 0 {
            return Ok(());
        }

        let aligned = (needed + 3) & !3;
        let available = self.data.len() - self.position;
        if needed > available {
            return Err(Error::Truncated {
                needed,
                available,
            });
        }

        // The region may end on an unaligned boundary; the keystream still
        // advances by whole words inside the cipher.
        let take = aligned.min(available);
        let mut plain = vec![0u8; take];
        self.cipher
            .decrypt(&mut plain, &self.data[self.position..self.position + take]);
        self.position += take;

        out[filled..].copy_from_slice(&plain[..needed]);

        let slack = take - needed;
        self.remainder[..slack].copy_from_slice(&plain[needed..]);
        self.remainder_start = 0;
        self.remainder_len = slack;

        Ok(())
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_into(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read four little-endian u32 words.
    pub fn read_u32x4(&mut self) -> Result<[u32; 4]> {
        Ok([
            self.read_u32()?,
            self.read_u32()?,
            self.read_u32()?,
            self.read_u32()?,
        ])
    }

    /// Read a UTF-16LE string of `code_units` units.
    pub fn read_utf16(&mut self, code_units: usize) -> Result<String> {
        let mut bytes = vec![0u8; code_units * 2];
        self.read_into(&mut bytes)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&units).map_err(|e| Error::Common(e.into()))
    }

    /// Read `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        self.read_into(&mut bytes)?;
        Ok(bytes)
    }
}
