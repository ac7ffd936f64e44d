//! # OpenFlow Protocol Codec
//!
//! ## Purpose
//!
//! The "rules" layer between the pure message types and the transport:
//! - Stream framing driven by the header's declared length
//! - A kind → encode/decode lookup table (`CodecRegistry`)
//! - Field-level wire layouts for the built-in message catalog
//! - The structural comparison engine and its normalization hooks
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → libs/network
//!     ↑           ↓             ↓
//! Pure Data   Framing +     Sessions,
//! Structures  Comparison    Handshake
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket ownership or connection handling (belongs in `ofp-network`)
//! - Message data definitions (belongs in `ofp-types`)

pub mod compare;
pub mod error;
pub mod frame;
pub mod parser;
pub mod registry;
pub mod wire;

pub use compare::{
    compare_records, equal, normalize_matches, records_equal, restrict, values_equal,
    CompareError, Comparator, FieldMap, Mismatch, NormalizeHook,
};
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{FrameCodec, FrameReadError, READ_BUFFER_CAPACITY};
pub use parser::{frame_length, split_frame};
pub use registry::{CodecRegistry, DecodeFn, EncodeFn, KindCodec};
pub use wire::matching::{canonical_fields, normalize_match};
