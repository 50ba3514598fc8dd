//! Byte sources and the bounded cursor every header parser reads through.
//!
//! A parse call owns exactly one [`ImageSource`] and walks it with a
//! [`ByteCursor`]. The cursor never reads past the end of its slice: every
//! accessor checks the remaining length first and reports
//! [`ParseError::Truncated`] without moving the offset.

use std::fs::File;
use std::io;
use std::path::Path;

use memchr::memchr;
use memmap2::Mmap;

use crate::error::{ParseError, Result};

/// Byte order of multi-byte integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Bounded, seekable reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The whole underlying slice, independent of the current offset.
    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        self.data
    }

    fn truncated(&self, needed: usize) -> ParseError {
        ParseError::Truncated {
            offset: self.pos as u64,
            needed: needed as u64,
            available: self.remaining() as u64,
        }
    }

    /// Returns the next `n` bytes without advancing.
    pub fn peek(&self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.peek(n)?;
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Fails with `Truncated` unless at least `n` bytes remain.
    pub fn ensure(&self, n: u64) -> Result<()> {
        if n > self.remaining() as u64 {
            return Err(ParseError::Truncated {
                offset: self.pos as u64,
                needed: n,
                available: self.remaining() as u64,
            });
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        self.pos += n;
        Ok(())
    }

    /// Absolute repositioning. Seeking to exactly `len()` is allowed.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.data.len() as u64 {
            return Err(ParseError::OutOfBounds {
                offset,
                len: self.data.len() as u64,
            });
        }
        self.pos = offset as usize;
        Ok(())
    }

    /// A cursor over the same bytes, positioned at `offset`.
    pub fn fork_at(&self, offset: u64) -> Result<ByteCursor<'a>> {
        let mut fork = ByteCursor::new(self.data);
        fork.seek(offset)?;
        Ok(fork)
    }

    /// Fences the next `n` bytes into their own cursor and advances past them.
    pub fn sub_cursor(&mut self, n: usize) -> Result<ByteCursor<'a>> {
        self.read_bytes(n).map(ByteCursor::new)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self, endian: Endian) -> Result<u16> {
        let b = self.read_array::<2>()?;
        Ok(match endian {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        })
    }

    pub fn read_u32(&mut self, endian: Endian) -> Result<u32> {
        let b = self.read_array::<4>()?;
        Ok(match endian {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        })
    }

    pub fn read_u64(&mut self, endian: Endian) -> Result<u64> {
        let b = self.read_array::<8>()?;
        Ok(match endian {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
        })
    }

    pub fn read_i32(&mut self, endian: Endian) -> Result<i32> {
        let b = self.read_array::<4>()?;
        Ok(match endian {
            Endian::Little => i32::from_le_bytes(b),
            Endian::Big => i32::from_be_bytes(b),
        })
    }

    /// Reads up to the next `\n` and advances past it. The newline is not
    /// part of the returned slice.
    pub fn read_line(&mut self, max: usize) -> Result<&'a [u8]> {
        let window_end = self.pos.saturating_add(max).saturating_add(1).min(self.data.len());
        let window = &self.data[self.pos..window_end];

        match memchr(b'\n', window) {
            Some(i) => {
                let line = &window[..i];
                self.pos += i + 1;
                Ok(line)
            }
            None if window_end == self.data.len() => Err(self.truncated(window.len() + 1)),
            None => Err(ParseError::malformed(format!(
                "header line at offset {} exceeds {} bytes",
                self.pos, max
            ))),
        }
    }
}

/// The bytes of one inspected file or buffer.
///
/// Files are memory-mapped so that a parser touching only the first
/// few hundred bytes never pulls the rest of the file in.
pub enum ImageSource {
    Mapped(Mmap),
    Memory(Vec<u8>),
}

impl ImageSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();

        // Zero-length mappings are rejected by the OS.
        if size == 0 {
            return Ok(Self::Memory(Vec::new()));
        }

        // SAFETY: the mapping is read-only and dropped before `inspect`
        // returns; concurrent truncation of the file by another process is
        // outside what this crate can guard against.
        let mmap = unsafe { Mmap::map(&file) }?;

        #[cfg(unix)]
        {
            let _ = mmap.advise(memmap2::Advice::Random);
        }

        Ok(Self::Mapped(mmap))
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::Memory(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => &mmap[..],
            Self::Memory(bytes) => bytes.as_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(self.as_bytes())
    }
}
