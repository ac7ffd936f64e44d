//! # OpenFlow Message Types
//!
//! Pure data definitions for the controller-side conformance checker:
//!
//! - **Header**: the fixed 8-byte prefix of every wire message (network byte order)
//! - **MessageKind**: the closed set of OpenFlow 1.3 message types
//! - **Message / Body**: a tagged variant with one typed body per supported kind
//! - **Record / Value**: the field-name → value view used for structural comparison
//! - **TargetSet**: per-value comparison metadata ("only these fields matter")
//!
//! ## What This Crate Does NOT Contain
//! - Wire encoding/decoding of bodies (belongs in `ofp-codec`)
//! - Sockets, sessions or the handshake (belongs in `ofp-network`)
//!
//! ## Quick Start
//! ```rust
//! use types::{Body, FlowMod, Match, Message, TargetSet};
//!
//! let rule = FlowMod {
//!     priority: 10,
//!     match_: Match::new().in_port(1),
//!     ..FlowMod::add()
//! };
//! let msg = Message::new(Body::FlowMod(rule)).with_targets(["priority", "match"]);
//! assert_eq!(msg.targets, TargetSet::from(["match", "priority"]));
//! ```

pub mod protocol;
pub mod record;
pub mod targets;

pub use protocol::actions::{Action, Instruction};
pub use protocol::constants::*;
pub use protocol::kind::MessageKind;
pub use protocol::matching::{Match, OxmBasic, OxmField};
pub use protocol::message::controller::{
    Echo, ErrorMsg, Hello, OpaqueBody, SwitchConfig, SwitchFeatures,
};
pub use protocol::message::flow::{
    FlowMod, FlowStats, FlowStatsRequest, MultipartReply, MultipartReplyBody, MultipartRequest,
    MultipartRequestBody,
};
pub use protocol::message::header::Header;
pub use protocol::message::{Body, Message};
pub use record::{Record, Stringify, Value};
pub use targets::TargetSet;
