//! OpenFlow protocol layer
//!
//! Wire header, message kind enumeration, typed message bodies and the
//! nested structures (matches, instructions, actions) they carry.

pub mod actions;
pub mod constants;
pub mod kind;
pub mod matching;
pub mod message;

pub use constants::*;
pub use kind::MessageKind;
pub use message::{Body, Message};
