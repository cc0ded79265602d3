/// Little-endian field cursors over byte slices

use crate::error::{McdError, Result};

/// Reads fixed-width fields from a byte slice, tracking the offset
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the data
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume `len` bytes and return them
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(McdError::parse(
                self.pos,
                format!("expected {} bytes, {} remaining", len, self.remaining()),
            ));
        }

        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consume `len` bytes without looking at them
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Read a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian u16
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u32
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }
}

/// Writes fixed-width fields into a pre-sized byte slice
///
/// Layouts are static, so writing past the end of the slice is a bug and
/// panics.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Create a writer positioned at the start of `data`
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the data
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Copy raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    /// Write a single byte
    pub fn put_u8(&mut self, value: u8) {
        self.put_bytes(&[value]);
    }

    /// Write a little-endian u16
    pub fn put_u16_le(&mut self, value: u16) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Write a little-endian u32
    pub fn put_u32_le(&mut self, value: u32) {
        self.put_bytes(&value.to_le_bytes());
    }
}
