//! # Checker Configuration
//!
//! Settings and defaults for the controller-side checker: listen address,
//! protocol version, the datapath ids expected to connect, optional mutual
//! TLS, deadlines and the handshake expectations.
//!
//! ## Usage
//!
//! ```rust
//! use checker_config::{CheckerConfig, ReceivePolicy};
//!
//! let config = CheckerConfig::from_toml_str(r#"
//! port = 6653
//! dpids = [1, 2]
//! "#).unwrap();
//! assert_eq!(config.listen_addr(), "0.0.0.0:6653");
//! assert_eq!(config.receive_policy, ReceivePolicy::SkipOtherKinds);
//! ```

pub mod checker_config;
pub mod defaults;

// Re-export commonly used types
pub use checker_config::{CheckerConfig, HandshakeConfig, ReceivePolicy, Timeouts, TlsSettings};
