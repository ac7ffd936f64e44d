//! Connection Session
//!
//! One live switch connection: the stream, its accumulation buffer, the
//! transaction id counter and the datapath id it is known under. All reads
//! go through `FrameCodec::read_message` so bytes read ahead for the next
//! message stay in the buffer between calls.
//!
//! A fatal error (broken connection, lost frame alignment, socket I/O
//! failure) drops the stream; every later operation fails fast with
//! `SessionClosed`. A frame that was delimited but could not be decoded
//! (no codec for its kind, bad body) leaves the session usable.

use crate::transports::PeerStream;
use crate::{Result, TransportError};
use bytes::BytesMut;
use checker_config::ReceivePolicy;
use codec::{FrameCodec, ProtocolError, READ_BUFFER_CAPACITY};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use types::{Message, MessageKind, MAX_XID, MIN_XID};

/// Transaction id sequence for one session
///
/// Pre-increments, so the first id handed out is `min + 1`; after `max`
/// the counter wraps back to `min`.
#[derive(Debug, Clone)]
pub struct XidAllocator {
    current: u32,
    min: u32,
    max: u32,
}

impl XidAllocator {
    pub fn new() -> Self {
        Self::with_bounds(MIN_XID, MAX_XID)
    }

    pub fn with_bounds(min: u32, max: u32) -> Self {
        Self {
            current: min,
            min,
            max,
        }
    }

    pub fn allocate(&mut self) -> u32 {
        self.current = if self.current >= self.max {
            self.min
        } else {
            self.current + 1
        };
        self.current
    }
}

impl Default for XidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

pub struct Session {
    stream: Option<PeerStream>,
    peer_addr: SocketAddr,
    dpid: u64,
    xids: XidAllocator,
    buffer: BytesMut,
    codec: FrameCodec,
}

impl Session {
    pub fn new(stream: PeerStream, peer_addr: SocketAddr, dpid: u64, codec: FrameCodec) -> Self {
        Self {
            stream: Some(stream),
            peer_addr,
            dpid,
            xids: XidAllocator::new(),
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            codec,
        }
    }

    pub fn dpid(&self) -> u64 {
        self.dpid
    }

    pub(crate) fn set_dpid(&mut self, dpid: u64) {
        self.dpid = dpid;
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    pub fn allocate_xid(&mut self) -> u32 {
        self.xids.allocate()
    }

    /// Bytes buffered towards the next message
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn closed(&self) -> TransportError {
        TransportError::SessionClosed { dpid: self.dpid }
    }

    fn teardown(&mut self, err: &TransportError) {
        if err.is_fatal() && self.stream.take().is_some() {
            warn!(
                dpid = %format!("{:#x}", self.dpid),
                peer = %self.peer_addr,
                category = err.category(),
                "Session torn down: {}",
                err
            );
        }
    }

    /// Send `msg`, assigning an xid when it has none
    ///
    /// Returns the message as it went out (xid and length stamped). A
    /// deadline that expires before any byte was written is a plain
    /// `Timeout`; once part of the frame is out the peer's framing is lost
    /// and the session is torn down.
    pub async fn send(&mut self, mut msg: Message, timeout: Duration) -> Result<Message> {
        if self.is_closed() {
            return Err(self.closed());
        }
        if msg.xid.is_none() {
            msg.xid = Some(self.xids.allocate());
        }
        let frame = self
            .codec
            .encode(&msg)
            .map_err(|e| TransportError::codec(format!("Failed to encode {}", msg.kind()), e))?;
        msg.msg_len = frame.len() as u16;

        let peer_addr = self.peer_addr;
        let stream = self.stream.as_mut().ok_or(TransportError::SessionClosed { dpid: self.dpid })?;
        let mut written = 0;
        let outcome =
            tokio::time::timeout(timeout, write_frame(stream, &frame, &mut written, peer_addr)).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) if written > 0 => Err(TransportError::connection_broken(
                format!(
                    "send timed out after {} of {} bytes ({}ms)",
                    written,
                    frame.len(),
                    millis(timeout)
                ),
                Some(peer_addr),
            )),
            Err(_) => Err(TransportError::timeout("send", millis(timeout))),
        };

        if let Err(err) = result {
            self.teardown(&err);
            return Err(err);
        }

        debug!(
            dpid = %format!("{:#x}", self.dpid),
            kind = %msg.kind(),
            xid = ?msg.xid,
            bytes = frame.len(),
            "Sent message"
        );
        Ok(msg)
    }

    /// Wait up to `timeout` for one complete message
    pub async fn receive(&mut self, timeout: Duration) -> Result<Message> {
        let stream = self.stream.as_mut().ok_or(TransportError::SessionClosed { dpid: self.dpid })?;
        let read = tokio::time::timeout(timeout, self.codec.read_message(stream, &mut self.buffer)).await;

        let msg = match read {
            Err(_) => return Err(TransportError::timeout("receive", millis(timeout))),
            Ok(Err(err)) => {
                let err = TransportError::from(err);
                self.teardown(&err);
                return Err(err);
            }
            Ok(Ok(msg)) => msg,
        };

        debug!(
            dpid = %format!("{:#x}", self.dpid),
            kind = %msg.kind(),
            xid = ?msg.xid,
            bytes = msg.msg_len,
            "Received message"
        );
        Ok(msg)
    }

    /// Wait up to `timeout` for a message of `kind`
    ///
    /// Messages of other kinds, including kinds without a registered codec,
    /// are dropped under `SkipOtherKinds` and raise `UnexpectedKind` under
    /// `Strict`.
    pub async fn receive_kind(
        &mut self,
        kind: MessageKind,
        policy: ReceivePolicy,
        timeout: Duration,
    ) -> Result<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline
                .checked_duration_since(Instant::now())
                .filter(|left| !left.is_zero())
                .ok_or_else(|| TransportError::timeout("receive", millis(timeout)))?;

            let (actual, xid) = match self.receive(left).await {
                Ok(msg) if msg.kind() == kind => return Ok(msg),
                Ok(msg) => (msg.kind(), msg.xid),
                Err(TransportError::Frame {
                    source: ProtocolError::UnsupportedKind { kind: other, .. },
                }) if other != kind => (other, None),
                Err(err) => return Err(err),
            };

            match policy {
                ReceivePolicy::Strict => {
                    return Err(TransportError::UnexpectedKind {
                        expected: kind,
                        actual,
                    })
                }
                ReceivePolicy::SkipOtherKinds => warn!(
                    dpid = %format!("{:#x}", self.dpid),
                    expected = %kind,
                    %actual,
                    ?xid,
                    "Skipping message of another kind"
                ),
            }
        }
    }

    /// Release the socket; later operations fail with `SessionClosed`
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("Error shutting down connection to {}: {}", self.peer_addr, e);
            }
            info!(
                dpid = %format!("{:#x}", self.dpid),
                peer = %self.peer_addr,
                "Closed session"
            );
        }
    }
}

/// Write the whole frame, retrying partial writes
///
/// `written` tracks progress so a caller that abandons the future knows
/// whether the peer already holds part of the frame.
async fn write_frame(
    stream: &mut PeerStream,
    frame: &[u8],
    written: &mut usize,
    peer_addr: SocketAddr,
) -> Result<()> {
    while *written < frame.len() {
        let n = stream
            .write(&frame[*written..])
            .await
            .map_err(|e| TransportError::io("Failed to write message", e))?;
        if n == 0 {
            return Err(TransportError::connection_broken(
                "peer accepted zero bytes",
                Some(peer_addr),
            ));
        }
        *written += n;
    }
    stream
        .flush()
        .await
        .map_err(|e| TransportError::io("Failed to flush stream", e))
}
