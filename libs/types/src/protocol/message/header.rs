//! Message Header Implementation
//!
//! The header is identical for all messages and carries the framing and
//! correlation information the checker relies on.

use crate::protocol::constants::HEADER_SIZE;
use crate::protocol::kind::MessageKind;
use zerocopy::byteorder::{NetworkEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Ref, Unaligned};

/// Message Header (8 bytes, network byte order)
///
/// ```text
/// ┌─────────┬──────────┬──────────────┬──────────────────┐
/// │ version │ msg_type │ length (u16) │ xid (u32)        │
/// │ 1 byte  │ 1 byte   │ 2 bytes      │ 4 bytes          │
/// └─────────┴──────────┴──────────────┴──────────────────┘
/// ```
///
/// `length` counts the whole message including these 8 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes, Unaligned)]
pub struct Header {
    pub version: u8,
    pub msg_type: u8,
    pub length: U16<NetworkEndian>,
    pub xid: U32<NetworkEndian>,
}

impl Header {
    /// Header size in bytes
    pub const SIZE: usize = HEADER_SIZE;

    pub fn new(version: u8, kind: MessageKind, length: u16, xid: u32) -> Self {
        Self {
            version,
            msg_type: kind.into(),
            length: U16::new(length),
            xid: U32::new(xid),
        }
    }

    /// Borrow the header at the start of `data`, or `None` if fewer than
    /// `SIZE` bytes are available.
    pub fn parse(data: &[u8]) -> Option<&Header> {
        if data.len() < Self::SIZE {
            return None;
        }
        Ref::<_, Header>::new_unaligned(&data[..Self::SIZE]).map(|header| header.into_ref())
    }

    /// Total message length declared by the header
    pub fn length(&self) -> usize {
        self.length.get() as usize
    }

    pub fn xid(&self) -> u32 {
        self.xid.get()
    }

    /// Resolve the kind tag; the raw tag is returned when it is not a known kind.
    pub fn kind(&self) -> Result<MessageKind, u8> {
        MessageKind::try_from(self.msg_type).map_err(|_| self.msg_type)
    }

    /// Serialized header bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }
}
