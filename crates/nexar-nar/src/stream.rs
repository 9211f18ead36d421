//! Bounded window over a seekable byte source.

use std::io::{self, Read, Seek, SeekFrom};

use crate::Error;

/// Constrains a seekable source to the window `[offset, offset + length)`.
///
/// Positions and seeks are relative to the window; reads clamp so that the
/// position never passes `length`. Reading at the end yields 0 bytes.
pub struct BoundedStream<R> {
    inner: R,
    offset: u64,
    length: u64,
    position: u64,
}

impl<R: Read + Seek> BoundedStream<R> {
    /// Create a window over `inner`, seeking it to the window start.
    pub fn new(mut inner: R, offset: u64, length: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(offset))?;
        Ok(Self {
            inner,
            offset,
            length,
            position: 0,
        })
    }

    /// Window length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<R: Read + Seek> Read for BoundedStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.length - self.position;
        let take = (buf.len() as u64).min(available) as usize;
        if take == 0 {
            return Ok(0);
        }

        let n = self.inner.read(&mut buf[..take])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for BoundedStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => self.length as i64 + n,
            SeekFrom::Current(n) => self.position as i64 + n,
        };

        if target < 0 || target as u64 > self.length {
            return Err(Error::OutOfRange("seek outside stream window").into_io());
        }

        self.position = target as u64;
        self.inner.seek(SeekFrom::Start(self.offset + self.position))?;
        Ok(self.position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
