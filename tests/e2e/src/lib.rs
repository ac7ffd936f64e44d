//! End-to-End Test Framework for the OpenFlow checker
//!
//! Runs `OfpChecker` against mock switches that connect over loopback TCP,
//! so every scenario exercises the real listener, handshake and sessions.

pub mod fixtures;

pub use fixtures::*;

use checker_config::CheckerConfig;

/// Checker config bound to an ephemeral loopback port
pub fn loopback_config(dpids: &[u64]) -> CheckerConfig {
    CheckerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        dpids: dpids.to_vec(),
        ..CheckerConfig::default()
    }
}

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
