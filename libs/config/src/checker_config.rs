//! Checker Configuration Module
//!
//! Loads the checker's settings from a TOML file with `OFCHECK_*`
//! environment overrides layered on top. Nested keys use a double
//! underscore: `OFCHECK_TIMEOUTS__DEFAULT_MS=5000`.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Main checker configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Address to listen on for switch connections
    pub host: String,
    pub port: u16,

    /// Protocol version sent in every message and expected in replies
    pub version: u8,

    /// Datapath ids that must complete the handshake in `start`
    pub dpids: Vec<u64>,

    pub receive_policy: ReceivePolicy,

    /// Mutual TLS; plain TCP when absent
    pub tls: Option<TlsSettings>,

    pub timeouts: Timeouts,

    pub handshake: HandshakeConfig,
}

/// Server certificate, key and the CA used to verify client certificates
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TlsSettings {
    pub certfile: PathBuf,
    pub keyfile: PathBuf,
    pub ca_certs: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub default_ms: u64,
    pub poll_interval_ms: u64,
}

/// Features-reply fields checked during the handshake
///
/// Unset fields are not compared.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct HandshakeConfig {
    pub auxiliary_id: Option<u8>,
    pub capabilities: Option<u32>,
    pub n_buffers: Option<u32>,
    pub n_tables: Option<u8>,
}

/// What `receive` and the handshake do with a message of a different kind
/// than the one awaited
///
/// `Strict` is the literal raise-on-mismatch reading: the first message of
/// another kind fails the call with `UnexpectedKind`. `SkipOtherKinds`
/// tolerates asynchronous traffic (keepalives, packet-ins) interleaved with
/// replies; the deadline still bounds the wait.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceivePolicy {
    /// Log and drop it, keep polling for the awaited kind
    #[default]
    SkipOtherKinds,
    /// Fail immediately
    Strict,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            host: defaults::listen::HOST.to_string(),
            port: defaults::listen::PORT,
            version: defaults::protocol::VERSION,
            dpids: defaults::protocol::DPIDS.to_vec(),
            receive_policy: ReceivePolicy::default(),
            tls: None,
            timeouts: Timeouts::default(),
            handshake: HandshakeConfig::default(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_ms: defaults::timeouts::DEFAULT_MS,
            poll_interval_ms: defaults::timeouts::POLL_INTERVAL_MS,
        }
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            auxiliary_id: Some(defaults::protocol::AUXILIARY_ID),
            capabilities: None,
            n_buffers: None,
            n_tables: None,
        }
    }
}

impl Timeouts {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(defaults::ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("dpids")
}

impl CheckerConfig {
    /// Load configuration from a TOML file with environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading checker config: {:?}", path);
        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path.display()))?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        debug!(?config, "checker config loaded");
        Ok(config)
    }

    /// Parse inline TOML; environment overrides are not applied
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML (used by `--print-config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpids.is_empty() {
            bail!("at least one datapath id must be configured");
        }
        if self.dpids.contains(&0) {
            bail!("datapath id 0 is reserved for sessions that have not completed the handshake");
        }
        if self.timeouts.poll_interval_ms == 0 {
            bail!("timeouts.poll_interval_ms must be non-zero");
        }
        if let Some(tls) = &self.tls {
            for (name, path) in [
                ("certfile", &tls.certfile),
                ("keyfile", &tls.keyfile),
                ("ca_certs", &tls.ca_certs),
            ] {
                if !path.is_file() {
                    bail!("tls.{} {} does not exist", name, path.display());
                }
            }
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
