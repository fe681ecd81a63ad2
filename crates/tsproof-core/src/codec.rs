//! Byte-level reader and writer for the proof wire format.
//!
//! Integers are unsigned LEB128 varints. A "varbytes" field is a varint
//! length followed by that many raw bytes, and every varbytes read or write
//! names the maximum length it accepts.
//!
//! Reads never return partial data: running out of input is
//! [`Error::UnexpectedEndOfInput`], and a declared length above the bound is
//! [`Error::MalformedVarbytes`].

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Varint helpers
// ---------------------------------------------------------------------------

/// Encode an unsigned 64-bit value as LEB128.
pub fn encode_varint(value: u64, buf: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// Decode a LEB128-encoded unsigned varint from `data`, returning the value
/// and bytes consumed.
///
/// # Errors
///
/// Returns [`Error::UnexpectedEndOfInput`] if the data ends mid-varint and
/// [`Error::MalformedVarint`] if the value does not fit in 64 bits.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in data.iter().enumerate() {
        let low = u64::from(byte & 0x7F);
        if shift == 63 && low > 1 {
            return Err(Error::MalformedVarint);
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
        if shift > 63 {
            return Err(Error::MalformedVarint);
        }
    }
    Err(Error::UnexpectedEndOfInput { offset: data.len() })
}

// ---------------------------------------------------------------------------
// ByteReader
// ---------------------------------------------------------------------------

/// Cursor over an in-memory proof.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    /// Read a single byte.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedEndOfInput`] if the input is exhausted.
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(Error::UnexpectedEndOfInput { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnexpectedEndOfInput`] if fewer than `n` bytes remain. The
    /// cursor does not move on failure.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::UnexpectedEndOfInput {
                offset: self.data.len(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Read a fixed-size array.
    ///
    /// # Errors
    ///
    /// Same as [`ByteReader::read_bytes`].
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a LEB128 varint.
    ///
    /// # Errors
    ///
    /// See [`decode_varint`].
    pub fn read_varuint(&mut self) -> Result<u64> {
        let (value, consumed) =
            decode_varint(&self.data[self.pos..]).map_err(|e| match e {
                Error::UnexpectedEndOfInput { .. } => Error::UnexpectedEndOfInput {
                    offset: self.data.len(),
                },
                other => other,
            })?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a length-prefixed byte string of at most `max_len` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if the declared length exceeds
    /// `max_len`, [`Error::UnexpectedEndOfInput`] if the payload is
    /// truncated.
    pub fn read_varbytes(&mut self, max_len: usize) -> Result<&'a [u8]> {
        let len = self.read_varuint()?;
        let fits = usize::try_from(len).ok().filter(|&n| n <= max_len);
        let Some(n) = fits else {
            return Err(Error::MalformedVarbytes { len, max: max_len });
        };
        self.read_bytes(n)
    }

    /// Succeed only if every byte has been consumed.
    ///
    /// # Errors
    ///
    /// [`Error::TrailingBytes`] if unread input remains.
    pub fn assert_eof(&self) -> Result<()> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(Error::TrailingBytes {
                remaining: self.remaining(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// ByteWriter
// ---------------------------------------------------------------------------

/// Growable output buffer for the proof wire format.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_varuint(&mut self, value: u64) {
        encode_varint(value, &mut self.buf);
    }

    /// Write a length-prefixed byte string.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedVarbytes`] if `bytes` is longer than `max_len`;
    /// nothing is written in that case.
    pub fn write_varbytes(&mut self, bytes: &[u8], max_len: usize) -> Result<()> {
        if bytes.len() > max_len {
            return Err(Error::MalformedVarbytes {
                len: bytes.len() as u64,
                max: max_len,
            });
        }
        self.write_varuint(bytes.len() as u64);
        self.write_bytes(bytes);
        Ok(())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
