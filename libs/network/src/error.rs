//! Transport Error Types
//!
//! Error handling for sessions, the handshake and the orchestrator. Fatal
//! errors (`is_fatal`) tear the session down; everything else leaves it
//! usable for the caller to decide.

use codec::{FrameReadError, Mismatch, ProtocolError};
use std::net::SocketAddr;
use thiserror::Error;
use types::MessageKind;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Zero-length read, or the peer accepted zero bytes on write
    #[error("Connection broken: {message} (remote: {remote_addr:?})")]
    ConnectionBroken {
        message: String,
        remote_addr: Option<SocketAddr>,
    },

    /// Malformed or undecodable frame from the peer
    #[error("Frame error: {source}")]
    Frame {
        #[from]
        source: ProtocolError,
    },

    /// Deadline elapsed while awaiting accept, a frame or the handshake
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Received message differs from the expectation on the targeted fields
    #[error("Comparison mismatch: {mismatch}")]
    ComparisonMismatch { mismatch: Box<Mismatch> },

    /// A different kind arrived while the strict receive policy is active
    #[error("Unexpected message kind: expected {expected}, received {actual}")]
    UnexpectedKind {
        expected: MessageKind,
        actual: MessageKind,
    },

    /// No session is registered under this datapath id
    #[error("Unknown peer: no session for datapath id {dpid:#x}")]
    UnknownPeer { dpid: u64 },

    /// Operation on a session that was closed or torn down
    #[error("Session closed: datapath id {dpid:#x}")]
    SessionClosed { dpid: u64 },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// TLS setup or TLS handshake errors
    #[error("Security error: {message}")]
    Security {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A local message could not be encoded or normalized
    #[error("Codec error: {message}")]
    Codec {
        message: String,
        source: ProtocolError,
    },

    /// Generic I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        source: std::io::Error,
    },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    pub fn connection_broken(message: impl Into<String>, remote_addr: Option<SocketAddr>) -> Self {
        Self::ConnectionBroken {
            message: message.into(),
            remote_addr,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Create a security error
    pub fn security(message: impl Into<String>) -> Self {
        Self::Security {
            message: message.into(),
            source: None,
        }
    }

    /// Create a security error with source
    pub fn security_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Security {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn codec(message: impl Into<String>, source: ProtocolError) -> Self {
        Self::Codec {
            message: message.into(),
            source,
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Whether the session's byte stream can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::ConnectionBroken { .. } | TransportError::Io { .. } => true,
            TransportError::Frame { source } => source.breaks_framing(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            TransportError::ConnectionBroken { .. } => "connection",
            TransportError::Frame { .. } => "frame",
            TransportError::Timeout { .. } => "timeout",
            TransportError::ComparisonMismatch { .. } => "mismatch",
            TransportError::UnexpectedKind { .. } => "unexpected_kind",
            TransportError::UnknownPeer { .. } => "unknown_peer",
            TransportError::SessionClosed { .. } => "session_closed",
            TransportError::Configuration { .. } => "configuration",
            TransportError::Security { .. } => "security",
            TransportError::Codec { .. } => "codec",
            TransportError::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string(), err)
    }
}

impl From<FrameReadError> for TransportError {
    fn from(err: FrameReadError) -> Self {
        match err {
            FrameReadError::Closed { buffered } => Self::connection_broken(
                format!("peer closed the stream ({} bytes pending)", buffered),
                None,
            ),
            FrameReadError::Protocol(source) => Self::Frame { source },
            FrameReadError::Io(source) => Self::io("failed to read frame", source),
        }
    }
}
