//! Test fixtures: mock switches and a throwaway PKI

pub mod mock_switch;
pub mod pki;

pub use mock_switch::{MockSwitch, MockSwitchConfig, PACKET_IN};
pub use pki::TestPki;
