//! # Stream Framing
//!
//! Splits a byte stream into complete messages using only the header's
//! `length` field. Bodies are never inspected here, so a frame of a kind the
//! registry cannot decode still leaves the stream positioned at the next
//! message boundary.

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, Bytes, BytesMut};
use types::{Header, HEADER_SIZE};

/// Declared length of the frame at the start of `buffer`
///
/// `Ok(None)` when fewer than 8 bytes are available yet.
pub fn frame_length(buffer: &[u8]) -> ProtocolResult<Option<usize>> {
    let Some(header) = Header::parse(buffer) else {
        return Ok(None);
    };
    let declared = header.length();
    if declared < HEADER_SIZE {
        return Err(ProtocolError::malformed_header(declared, HEADER_SIZE));
    }
    Ok(Some(declared))
}

/// Remove and return the first complete frame from `buffer`
///
/// Leaves the buffer untouched when the frame is incomplete. On a malformed
/// header the offending 8 bytes are dropped so the caller can report the
/// error without re-reading the same header forever.
pub fn split_frame(buffer: &mut BytesMut) -> ProtocolResult<Option<Bytes>> {
    match frame_length(buffer) {
        Ok(Some(length)) if buffer.len() >= length => Ok(Some(buffer.split_to(length).freeze())),
        Ok(_) => Ok(None),
        Err(err) => {
            buffer.advance(HEADER_SIZE);
            Err(err)
        }
    }
}
