//! Body wire codecs
//!
//! Field-level layouts for the kinds in the built-in catalog. All integers
//! are big-endian; structures that the protocol pads to 8-byte boundaries
//! are padded here on encode and skipped on decode.

pub mod actions;
pub mod matching;
pub mod messages;

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{BufMut, BytesMut};

/// Bounds-checked big-endian reader over one body
pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
    context: &'static str,
}

impl<'a> WireReader<'a> {
    pub(crate) fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            context,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> ProtocolResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::truncated(
                self.context,
                self.offset,
                n,
                self.remaining(),
            ));
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, n: usize) -> ProtocolResult<()> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> ProtocolResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> ProtocolResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> ProtocolResult<u64> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_be_bytes(raw))
    }

    /// Everything not consumed yet
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.offset..];
        self.offset = self.data.len();
        bytes
    }

    /// Split off the next `n` bytes as a reader of their own
    pub(crate) fn sub(&mut self, n: usize, context: &'static str) -> ProtocolResult<WireReader<'a>> {
        let data = self.take(n)?;
        Ok(WireReader::new(data, context))
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> ProtocolError {
        ProtocolError::invalid_payload(self.context, self.offset, reason)
    }
}

/// Round `len` up to the next multiple of 8
pub(crate) fn align8(len: usize) -> usize {
    (len + 7) & !7
}

/// Zero-pad `out` so the structure that began at `start` ends on an 8-byte boundary
pub(crate) fn pad_from(out: &mut BytesMut, start: usize) {
    let written = out.len() - start;
    out.put_bytes(0, align8(written) - written);
}

/// Overwrite a big-endian u16 length placeholder written earlier
pub(crate) fn patch_u16(out: &mut BytesMut, at: usize, value: usize) -> ProtocolResult<()> {
    let value = u16::try_from(value).map_err(|_| ProtocolError::MessageTooLarge {
        size: value,
        max: u16::MAX as usize,
    })?;
    out[at..at + 2].copy_from_slice(&value.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_truncation_offset() {
        let mut reader = WireReader::new(&[0x00, 0x01, 0x02], "flow stats");
        assert_eq!(reader.u16().unwrap(), 1);
        let err = reader.u32().unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Truncated {
                context: "flow stats".to_string(),
                offset: 2,
                need: 4,
                available: 1,
            }
        );
    }

    #[test]
    fn test_padding_helpers() {
        assert_eq!(align8(0), 0);
        assert_eq!(align8(4), 8);
        assert_eq!(align8(16), 16);

        let mut out = BytesMut::new();
        out.put_u16(1);
        out.put_u16(2);
        out.put_u8(3);
        pad_from(&mut out, 0);
        assert_eq!(out.len(), 8);
    }
}
