//! Byte sources for the delimited reader.
//!
//! Two kinds of input are supported: a contiguous in-memory buffer
//! ([`SliceSource`]), which also enables zero-copy views, and a forward-only
//! stream ([`StreamSource`]) read through an internal buffer. A
//! [`UnitReader`] groups the bytes of either into code units of the active
//! encoding.

use crate::common::Result;
use crate::common::encoding::{TextEncoding, UnitStream};
use std::io::Read;

/// Forward-only byte input.
pub trait ByteSource {
    /// Returns the next byte, or `None` at end of input.
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;

    /// Up to `n` upcoming bytes, without consuming them.
    ///
    /// Fewer bytes are returned only at end of input.
    fn peek_prefix(&mut self, n: usize) -> Result<&[u8]>;

    /// Consumes `n` bytes.
    fn skip(&mut self, n: usize) -> Result<()> {
        for _ in 0..n {
            if self.next_byte()?.is_none() {
                break;
            }
        }
        Ok(())
    }
}

/// Contiguous in-memory input.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn peek_prefix(&mut self, n: usize) -> Result<&[u8]> {
        let end = (self.pos + n).min(self.data.len());
        Ok(&self.data[self.pos..end])
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.pos = (self.pos + n).min(self.data.len());
        Ok(())
    }
}

/// Buffered forward-only input over any [`Read`].
pub struct StreamSource<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    consumed: usize,
}

impl<R: Read> StreamSource<R> {
    /// Create a new stream source with a read buffer of `buffer_size` bytes
    pub fn new(reader: R, buffer_size: usize) -> Self {
        StreamSource {
            reader,
            // At least one BOM worth of bytes must fit
            buffer: vec![0; buffer_size.max(4)],
            buffer_pos: 0,
            buffer_len: 0,
            consumed: 0,
        }
    }

    /// Refills the buffer, returning the number of new bytes.
    fn refill(&mut self) -> Result<usize> {
        self.buffer_len = loop {
            match self.reader.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        self.buffer_pos = 0;
        Ok(self.buffer_len)
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.buffer_pos >= self.buffer_len && self.refill()? == 0 {
            return Ok(None);
        }
        let byte = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        self.consumed += 1;
        Ok(Some(byte))
    }

    #[inline]
    fn position(&self) -> usize {
        self.consumed
    }

    fn peek_prefix(&mut self, n: usize) -> Result<&[u8]> {
        let n = n.min(self.buffer.len());
        if self.buffer_len - self.buffer_pos < n {
            // Move the unread tail to the front and top it up
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
            self.buffer_len -= self.buffer_pos;
            self.buffer_pos = 0;
            while self.buffer_len < n {
                let read = self.reader.read(&mut self.buffer[self.buffer_len..])?;
                if read == 0 {
                    break;
                }
                self.buffer_len += read;
            }
        }
        let end = (self.buffer_pos + n).min(self.buffer_len);
        Ok(&self.buffer[self.buffer_pos..end])
    }
}

/// Groups the bytes of a [`ByteSource`] into code units.
pub struct UnitReader<S> {
    source: S,
    encoding: TextEncoding,
    pending: Option<u32>,
}

impl<S: ByteSource> UnitReader<S> {
    pub fn new(source: S, encoding: TextEncoding) -> Self {
        Self {
            source,
            encoding,
            pending: None,
        }
    }

    #[inline]
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Byte offset of the next unread unit.
    #[inline]
    pub fn position(&self) -> usize {
        let pending = if self.pending.is_some() { self.encoding.unit_width() } else { 0 };
        self.source.position() - pending
    }
}

impl<S: ByteSource> UnitStream for UnitReader<S> {
    fn next_unit(&mut self) -> Result<Option<u32>> {
        if let Some(unit) = self.pending.take() {
            return Ok(Some(unit));
        }

        let width = self.encoding.unit_width();
        if width == 1 {
            return Ok(self.source.next_byte()?.map(u32::from));
        }

        let mut bytes = [0u8; 4];
        for (i, slot) in bytes[..width].iter_mut().enumerate() {
            match self.source.next_byte()? {
                Some(byte) => *slot = byte,
                None if i == 0 => return Ok(None),
                // Truncated trailing unit
                None => return Ok(Some(u32::from(char::REPLACEMENT_CHARACTER))),
            }
        }
        Ok(Some(self.encoding.assemble_unit(&bytes[..width])))
    }

    #[inline]
    fn unread_unit(&mut self, unit: u32) {
        debug_assert!(self.pending.is_none(), "only one unit of pushback");
        self.pending = Some(unit);
    }
}
