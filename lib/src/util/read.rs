//! Seekable little-endian reader over an in-memory byte slice.
//!
//! Mesh files are loaded (or mapped) fully into memory for random-access
//! seeking, so the cursor is a position over a borrowed slice rather than a
//! buffered stream.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{DecodeError, Result};

#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self { Self { data, position: 0 } }

    /// Current absolute read position.
    #[inline]
    pub const fn position(&self) -> usize { self.position }

    #[inline]
    pub const fn len(&self) -> usize { self.data.len() }

    #[inline]
    pub const fn is_empty(&self) -> bool { self.data.is_empty() }

    #[inline]
    pub const fn remaining(&self) -> usize { self.data.len().saturating_sub(self.position) }

    /// Seek to an absolute offset. Seeking past the end is not itself an
    /// error; only a subsequent read fails.
    #[inline]
    pub fn seek_abs(&mut self, position: usize) { self.position = position; }

    /// Seek relative to the current position. Negative deltas rewind.
    #[inline]
    pub fn seek_rel(&mut self, delta: i64) {
        self.position = (self.position as i64).saturating_add(delta).max(0) as usize;
    }

    #[inline]
    fn eof(&self, needed: usize) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.position,
            needed,
            available: self.remaining(),
        }
    }

    /// Read `count` bytes and advance.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(self.eof(count));
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> { self.read_bytes(1).map(|b| b[0]) }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read `n` single-byte characters verbatim. Model names may be of
    /// arbitrary encoding, so the bytes are reinterpreted permissively
    /// instead of failing on invalid UTF-8. No trimming.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a NUL-terminated single-byte-per-character string, consuming the
    /// terminator. Fails with `UnexpectedEof` when no terminator remains.
    pub fn read_cstring(&mut self) -> Result<String> {
        let remaining = &self.data[self.position.min(self.data.len())..];
        let nul = remaining
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.eof(remaining.len() + 1))?;
        let s = String::from_utf8_lossy(&remaining[..nul]).into_owned();
        self.position += nul + 1;
        Ok(s)
    }
}

// binrw fixed-shape records are parsed through the same cursor.
impl Read for Reader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

impl Seek for Reader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(n) => self.position as i64 + n,
            SeekFrom::End(n) => self.data.len() as i64 + n,
        };
        if target < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start"));
        }
        self.position = target as usize;
        Ok(self.position as u64)
    }
}
