//! Handshake state machine
//!
//! ```text
//! LISTENING → ACCEPTED → HELLO_SENT → HELLO_RECEIVED → FEATURES_REQUESTED → IDENTIFIED
//!                 └──────────────── any failure or timeout ───────────────→ FAILED
//! ```
//!
//! The features reply reveals the switch's datapath id; re-keying the
//! session under it is the orchestrator's job.

use crate::session::Session;
use crate::{Result, TransportError};
use checker_config::CheckerConfig;
use codec::{CompareError, Comparator};
use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::debug;
use types::{Body, Message, MessageKind, SwitchFeatures, SWITCH_FEATURES_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Listening,
    Accepted,
    HelloSent,
    HelloReceived,
    FeaturesRequested,
    Identified(u64),
    Failed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeState::Listening => write!(f, "LISTENING"),
            HandshakeState::Accepted => write!(f, "ACCEPTED"),
            HandshakeState::HelloSent => write!(f, "HELLO_SENT"),
            HandshakeState::HelloReceived => write!(f, "HELLO_RECEIVED"),
            HandshakeState::FeaturesRequested => write!(f, "FEATURES_REQUESTED"),
            HandshakeState::Identified(dpid) => write!(f, "IDENTIFIED({:#x})", dpid),
            HandshakeState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Expected hello: only version and kind are checked
pub fn hello_expectation(version: u8) -> Message {
    Message::hello()
        .with_version(version)
        .with_targets(["version", "msg_type"])
}

/// Expected features reply for a request sent with `xid`
///
/// Header fields are always checked; body fields only when configured.
pub fn features_expectation(config: &CheckerConfig, xid: Option<u32>) -> Message {
    let handshake = &config.handshake;
    let mut targets = vec!["version", "msg_type", "msg_len", "xid"];
    let mut features = SwitchFeatures::default();
    if let Some(auxiliary_id) = handshake.auxiliary_id {
        features.auxiliary_id = auxiliary_id;
        targets.push("auxiliary_id");
    }
    if let Some(capabilities) = handshake.capabilities {
        features.capabilities = capabilities;
        targets.push("capabilities");
    }
    if let Some(n_buffers) = handshake.n_buffers {
        features.n_buffers = n_buffers;
        targets.push("n_buffers");
    }
    if let Some(n_tables) = handshake.n_tables {
        features.n_tables = n_tables;
        targets.push("n_tables");
    }

    let mut msg = Message::new(Body::FeaturesReply(features))
        .with_version(config.version)
        .with_msg_len(SWITCH_FEATURES_SIZE)
        .with_targets(targets);
    msg.xid = xid;
    msg
}

fn remaining(deadline: Instant, total: Duration) -> Result<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
        .ok_or_else(|| TransportError::timeout("handshake", total.as_millis() as u64))
}

/// Drives one connection from accept to a learned datapath id
pub struct Handshake<'a> {
    config: &'a CheckerConfig,
    comparator: &'a Comparator,
    state: HandshakeState,
    peer: Option<SocketAddr>,
}

impl<'a> Handshake<'a> {
    pub fn new(config: &'a CheckerConfig, comparator: &'a Comparator) -> Self {
        Self {
            config,
            comparator,
            state: HandshakeState::Listening,
            peer: None,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    fn transition(&mut self, next: HandshakeState) {
        debug!(peer = ?self.peer, from = %self.state, to = %next, "Handshake transition");
        self.state = next;
    }

    pub fn accepted(&mut self, peer: SocketAddr) {
        self.peer = Some(peer);
        self.transition(HandshakeState::Accepted);
    }

    /// Run the exchange; any error leaves the state at `Failed`
    pub async fn run(&mut self, session: &mut Session, timeout: Duration) -> Result<u64> {
        let deadline = Instant::now() + timeout;
        match self.exchange(session, deadline, timeout).await {
            Ok(dpid) => {
                self.transition(HandshakeState::Identified(dpid));
                Ok(dpid)
            }
            Err(err) => {
                self.transition(HandshakeState::Failed);
                Err(err)
            }
        }
    }

    fn check(&self, expected: &Message, actual: &Message) -> Result<()> {
        self.comparator
            .compare(expected, actual)
            .map_err(|err| match err {
                CompareError::Mismatch(mismatch) => TransportError::ComparisonMismatch { mismatch },
                CompareError::Normalize { kind, source } => {
                    TransportError::codec(format!("Failed to normalize {}", kind), source)
                }
            })
    }

    async fn exchange(&mut self, session: &mut Session, deadline: Instant, total: Duration) -> Result<u64> {
        let version = self.config.version;
        let policy = self.config.receive_policy;

        session
            .send(Message::hello().with_version(version), remaining(deadline, total)?)
            .await?;
        self.transition(HandshakeState::HelloSent);

        let hello = session
            .receive_kind(MessageKind::Hello, policy, remaining(deadline, total)?)
            .await?;
        self.check(&hello_expectation(version), &hello)?;
        self.transition(HandshakeState::HelloReceived);

        let request = session
            .send(
                Message::features_request().with_version(version),
                remaining(deadline, total)?,
            )
            .await?;
        self.transition(HandshakeState::FeaturesRequested);

        let reply = session
            .receive_kind(MessageKind::FeaturesReply, policy, remaining(deadline, total)?)
            .await?;
        self.check(&features_expectation(self.config, request.xid), &reply)?;

        match reply.body {
            Body::FeaturesReply(features) => Ok(features.datapath_id),
            // unreachable after a successful kind check
            other => Err(TransportError::UnexpectedKind {
                expected: types::MessageKind::FeaturesReply,
                actual: other.kind(),
            }),
        }
    }
}
