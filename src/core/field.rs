//! # Field Codec
//!
//! Fixed-width integer and raw byte fields, little-endian throughout.
//!
//! Encoders take a `u64` so that callers holding wider values get a
//! [`ProtocolError::ValueOutOfRange`] instead of a silent truncation.
//! Decoders take an offset and return the offset just past the field, so
//! they chain naturally; [`FieldReader`] and [`FieldWriter`] wrap that
//! chaining for payload layouts.

use bytes::{BufMut, BytesMut};

use crate::error::{ProtocolError, Result};

fn check_width(value: u64, bits: u8) -> Result<()> {
    if bits < 64 && value >> bits != 0 {
        return Err(ProtocolError::ValueOutOfRange { value, bits });
    }
    Ok(())
}

fn take<const N: usize>(bytes: &[u8], offset: usize) -> Result<([u8; N], usize)> {
    let available = bytes.len().saturating_sub(offset);
    if available < N {
        return Err(ProtocolError::BufferTooShort {
            needed: N,
            available,
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    Ok((out, offset + N))
}

pub fn encode_u8(value: u64) -> Result<[u8; 1]> {
    check_width(value, 8)?;
    Ok([value as u8])
}

pub fn encode_u16(value: u64) -> Result<[u8; 2]> {
    check_width(value, 16)?;
    Ok((value as u16).to_le_bytes())
}

pub fn encode_u32(value: u64) -> Result<[u8; 4]> {
    check_width(value, 32)?;
    Ok((value as u32).to_le_bytes())
}

/// Append raw bytes to `dst`.
pub fn encode_bytes(dst: &mut BytesMut, data: &[u8]) {
    dst.reserve(data.len());
    dst.put_slice(data);
}

pub fn decode_u8(bytes: &[u8], offset: usize) -> Result<(u8, usize)> {
    let (raw, next) = take::<1>(bytes, offset)?;
    Ok((raw[0], next))
}

pub fn decode_u16(bytes: &[u8], offset: usize) -> Result<(u16, usize)> {
    let (raw, next) = take::<2>(bytes, offset)?;
    Ok((u16::from_le_bytes(raw), next))
}

pub fn decode_u32(bytes: &[u8], offset: usize) -> Result<(u32, usize)> {
    let (raw, next) = take::<4>(bytes, offset)?;
    Ok((u32::from_le_bytes(raw), next))
}

/// Borrow `len` raw bytes starting at `offset`.
pub fn decode_bytes(bytes: &[u8], offset: usize, len: usize) -> Result<(&[u8], usize)> {
    let available = bytes.len().saturating_sub(offset);
    if available < len {
        return Err(ProtocolError::BufferTooShort {
            needed: len,
            available,
        });
    }
    Ok((&bytes[offset..offset + len], offset + len))
}

/// Narrow a wide value into a single wire byte.
pub(crate) fn narrow_u8(value: u64) -> Result<u8> {
    encode_u8(value).map(|[b]| b)
}

/// Cursor over a byte slice that reads consecutive fields.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let (value, next) = decode_u8(self.bytes, self.offset)?;
        self.offset = next;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let (value, next) = decode_u16(self.bytes, self.offset)?;
        self.offset = next;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, next) = decode_u32(self.bytes, self.offset)?;
        self.offset = next;
        Ok(value)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let (value, next) = decode_bytes(self.bytes, self.offset, len)?;
        self.offset = next;
        Ok(value)
    }

    /// Current offset into the underlying slice.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

/// Appends encoded fields to a growable buffer.
#[derive(Debug, Default)]
pub struct FieldWriter {
    buf: BytesMut,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u64) -> Result<&mut Self> {
        self.buf.put_slice(&encode_u8(value)?);
        Ok(self)
    }

    pub fn write_u16(&mut self, value: u64) -> Result<&mut Self> {
        self.buf.put_slice(&encode_u16(value)?);
        Ok(self)
    }

    pub fn write_u32(&mut self, value: u64) -> Result<&mut Self> {
        self.buf.put_slice(&encode_u32(value)?);
        Ok(self)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        encode_bytes(&mut self.buf, data);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer, returning the encoded bytes.
    pub fn into_inner(self) -> BytesMut {
        self.buf
    }
}
