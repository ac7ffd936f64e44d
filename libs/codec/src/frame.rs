//! Frame codec over an async byte source
//!
//! `FrameCodec` combines stream framing with the codec registry. The read
//! path accumulates into a caller-owned `BytesMut` so that bytes belonging
//! to the next message survive between calls, and so that a read cancelled
//! by a timeout loses nothing (`read_buf` is cancel-safe).

use crate::error::{ProtocolError, ProtocolResult};
use crate::parser::split_frame;
use crate::registry::CodecRegistry;
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};
use types::Message;

/// Initial capacity of a session's accumulation buffer
pub const READ_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum FrameReadError {
    /// Peer closed the stream; `buffered` bytes of a partial frame were pending
    #[error("Stream closed by peer ({buffered} bytes of a partial frame pending)")]
    Closed { buffered: usize },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error while reading frame: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    registry: Arc<CodecRegistry>,
}

impl FrameCodec {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn encode(&self, msg: &Message) -> ProtocolResult<Bytes> {
        self.registry.encode(msg)
    }

    /// Decode the first complete message in `buffer`, if there is one
    ///
    /// A frame that fails to decode has already been removed from the
    /// buffer, so the next call starts at the following message.
    pub fn decode_frame(&self, buffer: &mut BytesMut) -> ProtocolResult<Option<Message>> {
        match split_frame(buffer)? {
            Some(frame) => self.registry.decode(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Read until one complete message is available and decode it
    pub async fn read_message<R>(
        &self,
        source: &mut R,
        buffer: &mut BytesMut,
    ) -> Result<Message, FrameReadError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(msg) = self.decode_frame(buffer)? {
                trace!(kind = %msg.kind(), xid = ?msg.xid, len = msg.msg_len, "decoded message");
                return Ok(msg);
            }
            if buffer.capacity() == buffer.len() {
                buffer.reserve(READ_BUFFER_CAPACITY);
            }
            let n = source.read_buf(buffer).await?;
            if n == 0 {
                debug!(buffered = buffer.len(), "peer closed stream");
                return Err(FrameReadError::Closed {
                    buffered: buffer.len(),
                });
            }
        }
    }
}
