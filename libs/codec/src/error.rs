//! Protocol-level errors for OpenFlow frame and body processing
//!
//! Each variant carries enough context to diagnose a bad byte stream from a
//! test log alone: offsets, declared versus available sizes, and for
//! undecodable kinds the raw frame bytes.

use thiserror::Error;
use types::MessageKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Buffer is too small to contain the expected structure
    #[error("Message too small: need {need} bytes, got {got} (context: {context})")]
    MessageTooSmall {
        need: usize,
        got: usize,
        context: String,
    },

    /// Header declares a total length smaller than the header itself
    #[error("Malformed header: declared length {declared} is below header size {minimum}")]
    MalformedHeader { declared: usize, minimum: usize },

    /// Kind tag outside the closed set of message kinds
    #[error("Unknown message kind {tag} (frame: 0x{})", hex::encode(.raw))]
    UnknownKind { tag: u8, raw: Vec<u8> },

    /// Known kind with no codec registered
    #[error("No codec registered for {kind} (frame: 0x{})", hex::encode(.raw))]
    UnsupportedKind { kind: MessageKind, raw: Vec<u8> },

    /// Structure inside a body runs past the end of its enclosing data
    #[error("Truncated {context} at offset {offset}: need {need} bytes, {available} available")]
    Truncated {
        context: String,
        offset: usize,
        need: usize,
        available: usize,
    },

    /// Body contents violate the layout for the kind
    #[error("Invalid {context} payload at offset {offset}: {reason}")]
    InvalidPayload {
        context: String,
        offset: usize,
        reason: String,
    },

    /// Encoded message does not fit the 16-bit length field
    #[error("Message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },
}

impl ProtocolError {
    pub fn message_too_small(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::MessageTooSmall {
            need,
            got,
            context: context.into(),
        }
    }

    pub fn malformed_header(declared: usize, minimum: usize) -> Self {
        Self::MalformedHeader { declared, minimum }
    }

    pub fn unknown_kind(tag: u8, raw: &[u8]) -> Self {
        Self::UnknownKind {
            tag,
            raw: raw.to_vec(),
        }
    }

    pub fn unsupported_kind(kind: MessageKind, raw: &[u8]) -> Self {
        Self::UnsupportedKind {
            kind,
            raw: raw.to_vec(),
        }
    }

    pub fn truncated(context: impl Into<String>, offset: usize, need: usize, available: usize) -> Self {
        Self::Truncated {
            context: context.into(),
            offset,
            need,
            available,
        }
    }

    pub fn invalid_payload(
        context: impl Into<String>,
        offset: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPayload {
            context: context.into(),
            offset,
            reason: reason.into(),
        }
    }

    /// Raw frame bytes kept for diagnostics, when the error carries them
    pub fn raw_frame(&self) -> Option<&[u8]> {
        match self {
            Self::UnknownKind { raw, .. } | Self::UnsupportedKind { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the stream can no longer be trusted past this error.
    /// Body-level failures of a delimited frame leave the next frame intact.
    pub fn breaks_framing(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader { .. } | Self::UnknownKind { .. } | Self::MessageTooSmall { .. }
        )
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
