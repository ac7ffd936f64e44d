//! Protocol constants
//!
//! Values fixed by the OpenFlow 1.3 specification that the checker and its
//! message catalog refer to by name.

/// OpenFlow 1.3 wire version
pub const OFP_VERSION: u8 = 0x04;

/// Size of the fixed message header
pub const HEADER_SIZE: usize = 8;

/// Largest message the 16-bit length field can describe
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Transaction id range; allocation wraps from `MAX_XID` back to `MIN_XID`
pub const MIN_XID: u32 = 0;
pub const MAX_XID: u32 = u32::MAX;

/// Wire length of a features reply (header + body)
pub const SWITCH_FEATURES_SIZE: u16 = 32;

// Reserved ports
pub const OFPP_IN_PORT: u32 = 0xffff_fff8;
pub const OFPP_TABLE: u32 = 0xffff_fff9;
pub const OFPP_NORMAL: u32 = 0xffff_fffa;
pub const OFPP_FLOOD: u32 = 0xffff_fffb;
pub const OFPP_ALL: u32 = 0xffff_fffc;
pub const OFPP_CONTROLLER: u32 = 0xffff_fffd;
pub const OFPP_LOCAL: u32 = 0xffff_fffe;
pub const OFPP_ANY: u32 = 0xffff_ffff;

/// Wildcard group
pub const OFPG_ANY: u32 = 0xffff_ffff;

/// All tables
pub const OFPTT_ALL: u8 = 0xff;

/// Packet is not buffered on the switch
pub const OFP_NO_BUFFER: u32 = 0xffff_ffff;

// Flow mod commands
pub const OFPFC_ADD: u8 = 0;
pub const OFPFC_MODIFY: u8 = 1;
pub const OFPFC_MODIFY_STRICT: u8 = 2;
pub const OFPFC_DELETE: u8 = 3;
pub const OFPFC_DELETE_STRICT: u8 = 4;

// Multipart types
pub const OFPMP_DESC: u16 = 0;
pub const OFPMP_FLOW: u16 = 1;

/// OXM class for the basic match fields
pub const OFPXMC_OPENFLOW_BASIC: u16 = 0x8000;

/// Match type carried in every `ofp_match`
pub const OFPMT_OXM: u16 = 1;
