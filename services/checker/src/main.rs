//! ofcheck - controller-side OpenFlow checker
//!
//! Listens for the configured switches, completes the hello and features
//! handshake with each, then runs a short liveness check (echo round trip
//! followed by a barrier) before closing every session.

use anyhow::{Context, Result};
use checker_config::CheckerConfig;
use clap::Parser;
use network::OfpChecker;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::{Body, Echo, Message, TargetSet};

const ECHO_PAYLOAD: &[u8] = b"ofcheck";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Datapath id to wait for; repeat for several switches
    #[arg(long = "dpid", value_parser = parse_dpid)]
    dpids: Vec<u64>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Time allowed for all switches to connect, in seconds
    #[arg(long, default_value_t = 60)]
    start_timeout_secs: u64,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Accepts decimal or `0x`-prefixed hex
fn parse_dpid(raw: &str) -> std::result::Result<u64, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("invalid datapath id {:?}: {}", raw, e))
}

fn load_config(args: &Args) -> Result<CheckerConfig> {
    let mut config = match &args.config {
        Some(path) => CheckerConfig::load(path)?,
        None => CheckerConfig::default(),
    };
    if !args.dpids.is_empty() {
        config.dpids = args.dpids.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Echo round trip with a pinned xid, then a barrier
async fn check_liveness(checker: &OfpChecker, dpid: u64, timeout: Duration) -> Result<()> {
    let request = checker
        .send_msg(dpid, Message::echo_request(ECHO_PAYLOAD), timeout)
        .await
        .with_context(|| format!("Failed to send echo request to {:#x}", dpid))?;

    let targets: TargetSet = ["version", "msg_type", "xid", "data"].into();
    let (_, reply) = checker
        .recv_msg(
            dpid,
            Message::new(Body::EchoReply(Echo::new(ECHO_PAYLOAD))),
            Some(targets),
            request.xid,
            0,
            timeout,
        )
        .await
        .with_context(|| format!("Echo reply from {:#x} did not match", dpid))?;
    info!(dpid = %format!("{:#x}", dpid), xid = ?reply.xid, "Echo reply received");

    let barrier = checker
        .send_msg(dpid, Message::barrier_request(), timeout)
        .await
        .with_context(|| format!("Failed to send barrier to {:#x}", dpid))?;
    checker
        .recv_msg(
            dpid,
            Message::new(Body::BarrierReply),
            Some(["msg_type", "xid"].into()),
            barrier.xid,
            0,
            timeout,
        )
        .await
        .with_context(|| format!("Barrier reply from {:#x} did not match", dpid))?;
    info!(dpid = %format!("{:#x}", dpid), "Barrier acknowledged");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&args).context("Invalid configuration")?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let timeout = config.timeouts.default_timeout();
    let dpids = config.dpids.clone();
    info!(listen = %config.listen_addr(), dpids = ?dpids, "Starting OpenFlow checker");

    let mut checker = OfpChecker::new(config);
    checker
        .start(&dpids, Duration::from_secs(args.start_timeout_secs))
        .await
        .context("Switches did not complete the handshake")?;

    let mut outcome = Ok(());
    for dpid in &dpids {
        if let Err(e) = check_liveness(&checker, *dpid, timeout).await {
            error!("Liveness check failed: {:#}", e);
            outcome = Err(e);
            break;
        }
    }

    checker.close().await;
    if outcome.is_ok() {
        info!("All switches passed");
    }
    outcome
}
