//! Bounds-checked cursor over a byte slice.

use crate::error::DecodeError;

/// Sequential reader that refuses to read past the end of its slice.
///
/// Offsets in errors are relative to the start of the slice the reader
/// was created with.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    layer: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(layer: &'static str, data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            layer,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(DecodeError::Truncated {
                layer: self.layer,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_be(&mut self) -> Result<u16, DecodeError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}
