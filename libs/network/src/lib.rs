//! Controller-side networking for the OpenFlow checker
//!
//! - `transports`: TCP listener, optional TLS with client certificates
//! - `session`: one switch connection with its buffer and xid counter
//! - `handshake`: hello and features exchange that learns the datapath id
//! - `checker`: `OfpChecker`, the orchestrator keyed by datapath id

pub mod checker;
pub mod error;
pub mod handshake;
pub mod session;
pub mod transports;

pub use checker::{OfpChecker, SharedSession, PLACEHOLDER_DPID};
pub use error::{Result, TransportError};
pub use handshake::{features_expectation, hello_expectation, Handshake, HandshakeState};
pub use session::{Session, XidAllocator};
pub use transports::{OfpListener, PeerStream};
