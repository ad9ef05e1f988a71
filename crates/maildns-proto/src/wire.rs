//! Wire format cursor and writer.
//!
//! `WireReader` tracks its own position and the bytes left, so no decode
//! path ever indexes the packet directly. `WireWriter` is the mirror image
//! used to build queries.

use crate::error::{Error, Result};
use crate::name::{Name, NameParser};
use bytes::{BufMut, Bytes, BytesMut};

/// A cursor over a DNS message.
///
/// The cursor always sees the whole message so that compressed names can
/// be followed, but reads are bounds-checked against its end.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a reader positioned at `pos`.
    #[inline]
    pub const fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Returns the whole message.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the current position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns true if there are no unread bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Advances the position by `n` bytes.
    #[inline]
    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::unexpected_eof(self.pos.saturating_add(n)));
        }
        self.pos += n;
        Ok(())
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let [value] = self.read_array::<1>()?;
        Ok(value)
    }

    /// Reads a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array::<2>().map(u16::from_be_bytes)
    }

    /// Reads a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }

    /// Reads `len` bytes.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::unexpected_eof(self.pos.saturating_add(len)));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads a possibly compressed domain name.
    pub fn read_name(&mut self) -> Result<Name> {
        let (name, consumed) = NameParser::new(self.data).parse_name(self.pos)?;
        self.pos += consumed;
        Ok(name)
    }

    /// Skips a possibly compressed domain name without expanding it.
    pub fn skip_name(&mut self) -> Result<()> {
        let consumed = NameParser::new(self.data).skip_name(self.pos)?;
        self.pos += consumed;
        Ok(())
    }

    /// Peeks at the next byte without advancing.
    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::unexpected_eof(self.pos))
    }

    /// Returns a slice at `offset` without moving the cursor.
    #[inline]
    pub fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::buffer_too_short(usize::MAX, self.data.len()))?;
        self.data
            .get(offset..end)
            .ok_or_else(|| Error::buffer_too_short(end, self.data.len()))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

/// A writer for DNS wire format data.
#[derive(Debug)]
pub struct WireWriter {
    buf: BytesMut,
    max_size: Option<usize>,
}

impl WireWriter {
    /// Creates a new wire writer with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            max_size: None,
        }
    }

    /// Creates a wire writer that refuses to grow past `max_size`.
    pub fn with_max_size(capacity: usize, max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity.min(max_size)),
            max_size: Some(max_size),
        }
    }

    /// Returns the current length.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the space left before the size limit.
    pub fn remaining(&self) -> usize {
        self.max_size
            .map_or(usize::MAX, |max| max.saturating_sub(self.buf.len()))
    }

    fn reserve(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::buffer_overflow(n, self.remaining()));
        }
        Ok(())
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    /// Writes a big-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?;
        self.buf.put_u16(value);
        Ok(())
    }

    /// Writes a big-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?;
        self.buf.put_u32(value);
        Ok(())
    }

    /// Writes a slice of bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes an uncompressed domain name.
    pub fn write_name(&mut self, name: &Name) -> Result<()> {
        self.write_bytes(name.as_wire())
    }

    /// Overwrites a big-endian u16 at `offset` (for back-patched lengths).
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> Result<()> {
        let end = offset + 2;
        if end > self.buf.len() {
            return Err(Error::buffer_too_short(end, self.buf.len()));
        }
        self.buf[offset..end].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Returns the written bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the data as frozen bytes.
    #[inline]
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Returns the data as an owned vector.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
