use std::ops::Range;

use super::error::DecodeError;
use super::layout;

/// Bounds-checked, big-endian view over an inbound buffer.
pub(crate) struct PacketReader<'a> {
    payload: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub(crate) fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub(crate) fn len(&self) -> usize {
        self.payload.len()
    }

    pub(crate) fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.payload.len() < needed {
            return Err(DecodeError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn read_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(DecodeError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub(crate) fn read_u16_be(&self, range: Range<usize>) -> Result<u16, DecodeError> {
        let bytes: [u8; 2] = self.read_array(range)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub(crate) fn read_u32_be(&self, range: Range<usize>) -> Result<u32, DecodeError> {
        let bytes: [u8; 4] = self.read_array(range)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub(crate) fn read_array<const N: usize>(
        &self,
        range: Range<usize>,
    ) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| DecodeError::TooShort {
            needed: N,
            actual: bytes.len(),
        })
    }

    pub(crate) fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.payload.get(range.clone()).ok_or(DecodeError::TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    /// Reads a NUL-padded text field up to its first NUL.
    pub(crate) fn read_padded_string(&self, range: Range<usize>) -> Result<String, DecodeError> {
        let bytes = self.read_slice(range)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Raw bytes of a field, or `None` when the buffer stops short of it.
    pub(crate) fn field(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.payload.get(range)
    }

    pub(crate) fn property_values(&self, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = layout::PROPERTY_VALUES_OFFSET + count;
        self.require_len(end)?;
        self.read_slice(layout::PROPERTY_VALUES_OFFSET..end)
    }
}
