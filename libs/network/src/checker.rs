//! # Protocol Orchestrator
//!
//! `OfpChecker` plays the controller for one or more switches under test.
//! `start` accepts connections until every expected datapath id completed
//! the handshake; afterwards test code drives each switch through `send` and
//! `receive` keyed by datapath id.
//!
//! ## Identity map
//!
//! A freshly accepted session is registered under `PLACEHOLDER_DPID`. Once
//! the features reply reveals the real datapath id the placeholder entry is
//! removed and the session inserted under the learned id inside one critical
//! section, so no id ever maps to two sessions and no session is reachable
//! under two ids.

use crate::handshake::Handshake;
use crate::session::Session;
use crate::transports::OfpListener;
use crate::{Result, TransportError};
use checker_config::CheckerConfig;
use codec::{CompareError, Comparator, FrameCodec};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use types::{Message, TargetSet};

/// Key of a session whose datapath id is not known yet
pub const PLACEHOLDER_DPID: u64 = 0;

/// Session handle shared between the identity map and callers
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

fn dpid_str(dpid: u64) -> String {
    format!("{:#x}", dpid)
}

pub struct OfpChecker {
    config: CheckerConfig,
    codec: FrameCodec,
    comparator: Comparator,
    listener: Option<OfpListener>,
    sessions: Mutex<HashMap<u64, SharedSession>>,
}

impl OfpChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            config,
            codec: FrameCodec::default(),
            comparator: Comparator::default(),
            listener: None,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the codec (e.g. a registry with extra opaque kinds)
    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Address actually bound, once `start` has run
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(OfpListener::local_addr)
    }

    /// Bind the listener without waiting for switches
    pub async fn listen(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr());
        }
        let listener = OfpListener::bind(&self.config.listen_addr(), self.config.tls.as_ref()).await?;
        let addr = listener.local_addr();
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Accept and handshake until every id in `dpids` is identified
    pub async fn start(&mut self, dpids: &[u64], timeout: Duration) -> Result<()> {
        if dpids.contains(&PLACEHOLDER_DPID) {
            return Err(TransportError::configuration(
                format!("datapath id {:#x} is reserved for unidentified sessions", PLACEHOLDER_DPID),
                Some("dpids"),
            ));
        }
        let deadline = Instant::now() + timeout;
        self.listen().await?;

        let mut pending: BTreeSet<u64> = {
            let sessions = self.sessions.lock();
            dpids
                .iter()
                .copied()
                .filter(|dpid| !sessions.contains_key(dpid))
                .collect()
        };

        while !pending.is_empty() {
            let left = deadline
                .checked_duration_since(Instant::now())
                .filter(|left| !left.is_zero())
                .ok_or_else(|| TransportError::timeout("start", timeout.as_millis() as u64))?;

            let mut handshake = Handshake::new(&self.config, &self.comparator);
            let listener = self
                .listener
                .as_ref()
                .ok_or_else(|| TransportError::configuration("listener not bound", None))?;
            let (stream, peer_addr) = match listener.accept(left).await {
                Ok(accepted) => accepted,
                Err(err @ TransportError::Security { .. }) => {
                    warn!("Rejected connection: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            handshake.accepted(peer_addr);

            let session: SharedSession = Arc::new(tokio::sync::Mutex::new(Session::new(
                stream,
                peer_addr,
                PLACEHOLDER_DPID,
                self.codec.clone(),
            )));
            self.sessions.lock().insert(PLACEHOLDER_DPID, Arc::clone(&session));

            let mut guard = session.lock().await;
            let learned = match handshake.run(&mut guard, left).await {
                Ok(dpid) => dpid,
                Err(err) => {
                    self.sessions.lock().remove(&PLACEHOLDER_DPID);
                    guard.close().await;
                    return Err(err);
                }
            };

            if !pending.contains(&learned) {
                warn!(
                    dpid = %dpid_str(learned),
                    peer = %peer_addr,
                    "Unexpected datapath id, closing connection"
                );
                self.sessions.lock().remove(&PLACEHOLDER_DPID);
                guard.close().await;
                continue;
            }

            guard.set_dpid(learned);
            drop(guard);
            self.rekey(PLACEHOLDER_DPID, learned);
            pending.remove(&learned);
            info!(dpid = %dpid_str(learned), peer = %peer_addr, "Switch identified");
        }
        Ok(())
    }

    /// Move the session under `from` to `to` in one critical section
    fn rekey(&self, from: u64, to: u64) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.remove(&from) {
            sessions.insert(to, session);
        }
    }

    pub fn session(&self, dpid: u64) -> Result<SharedSession> {
        self.sessions
            .lock()
            .get(&dpid)
            .cloned()
            .ok_or(TransportError::UnknownPeer { dpid })
    }

    /// Datapath ids with a registered session, sorted
    pub fn identifiers(&self) -> Vec<u64> {
        let mut dpids: Vec<u64> = self.sessions.lock().keys().copied().collect();
        dpids.sort_unstable();
        dpids
    }

    pub async fn send(&self, dpid: u64, msg: Message, timeout: Duration) -> Result<()> {
        self.send_msg(dpid, msg, timeout).await.map(|_| ())
    }

    /// Send and return the message as sent, xid included
    pub async fn send_msg(&self, dpid: u64, msg: Message, timeout: Duration) -> Result<Message> {
        let session = self.session(dpid)?;
        let mut session = session.lock().await;
        session.send(msg, timeout).await
    }

    /// Poll for the next message, comparing it with `expected` when given
    ///
    /// A message of another kind than `expected` is skipped or rejected
    /// according to the configured receive policy. A message of the same
    /// kind that fails the comparison raises `ComparisonMismatch`.
    pub async fn receive(
        &self,
        dpid: u64,
        expected: Option<&Message>,
        timeout: Duration,
    ) -> Result<Message> {
        let session = self.session(dpid)?;
        let mut session = session.lock().await;
        let deadline = Instant::now() + timeout;
        let poll_interval = self.config.timeouts.poll_interval();

        let msg = loop {
            let left = deadline
                .checked_duration_since(Instant::now())
                .filter(|left| !left.is_zero())
                .ok_or_else(|| TransportError::timeout("receive", timeout.as_millis() as u64))?;
            let slice = poll_interval.min(left);

            let attempt = match expected {
                Some(expected) => {
                    session
                        .receive_kind(expected.kind(), self.config.receive_policy, slice)
                        .await
                }
                None => session.receive(slice).await,
            };
            match attempt {
                Ok(msg) => break msg,
                Err(TransportError::Timeout { .. }) => continue,
                Err(err) => return Err(err),
            }
        };

        let Some(expected) = expected else {
            return Ok(msg);
        };
        match self.comparator.compare(expected, &msg) {
            Ok(()) => {
                debug!(dpid = %dpid_str(dpid), kind = %msg.kind(), "Received expected message");
                Ok(msg)
            }
            Err(CompareError::Mismatch(mismatch)) => {
                error!(
                    dpid = %dpid_str(dpid),
                    expected = ?mismatch.expected,
                    actual = ?mismatch.actual,
                    "{} comparison failed",
                    mismatch.name
                );
                Err(TransportError::ComparisonMismatch { mismatch })
            }
            Err(CompareError::Normalize { kind, source }) => Err(TransportError::codec(
                format!("Failed to normalize {}", kind),
                source,
            )),
        }
    }

    /// Stamp header fields and targets onto an expectation
    pub fn create_expected(
        &self,
        mut msg: Message,
        targets: Option<TargetSet>,
        xid: Option<u32>,
        msg_len: u16,
    ) -> Message {
        msg.version = self.config.version;
        msg.xid = xid;
        msg.msg_len = msg_len;
        if let Some(targets) = targets {
            msg.targets = targets;
        }
        msg
    }

    /// `create_expected` followed by `receive`; returns (expected, actual)
    pub async fn recv_msg(
        &self,
        dpid: u64,
        msg: Message,
        targets: Option<TargetSet>,
        xid: Option<u32>,
        msg_len: u16,
        timeout: Duration,
    ) -> Result<(Message, Message)> {
        let expected = self.create_expected(msg, targets, xid, msg_len);
        let actual = self.receive(dpid, Some(&expected), timeout).await?;
        Ok((expected, actual))
    }

    /// Close every session and release the listener
    pub async fn close(&mut self) {
        let sessions: Vec<(u64, SharedSession)> = self.sessions.lock().drain().collect();
        for (_, session) in sessions {
            session.lock().await.close().await;
        }
        if let Some(listener) = self.listener.take() {
            info!(local_addr = %listener.local_addr(), "Listener closed");
        }
    }
}
