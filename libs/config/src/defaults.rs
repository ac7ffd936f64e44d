//! Default configuration values
//!
//! Shared by `CheckerConfig::default()`, the serde field defaults and the
//! CLI so that every entry point agrees on them.

/// Listen address
pub mod listen {
    pub const HOST: &str = "0.0.0.0";

    /// IANA-unofficial OpenFlow port most switches dial by default
    pub const PORT: u16 = 6633;
}

/// Protocol defaults
pub mod protocol {
    /// OpenFlow 1.3
    pub const VERSION: u8 = 0x04;

    /// Datapath ids expected when none are configured
    pub const DPIDS: &[u64] = &[1];

    pub const AUXILIARY_ID: u8 = 0;
}

/// Timing defaults
pub mod timeouts {
    /// Deadline applied when a caller passes none (milliseconds)
    pub const DEFAULT_MS: u64 = 30_000;

    /// Upper bound on one receive attempt in the polling loop (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 100;
}

/// Environment variable prefix for overrides (`OFCHECK_PORT=6653`)
pub const ENV_PREFIX: &str = "OFCHECK";
