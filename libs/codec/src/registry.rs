//! Kind → codec table
//!
//! The registry is the single place that decides which kinds can be sent or
//! received. Decoding a frame whose kind has no entry yields
//! `UnsupportedKind` with the raw bytes attached; a kind tag outside the
//! enumeration yields `UnknownKind`.

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire::messages::*;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use tracing::trace;
use types::{Body, Header, Message, MessageKind, HEADER_SIZE, MAX_MESSAGE_SIZE};

/// Writes the body of one kind after the header
pub type EncodeFn = fn(&Body, &mut BytesMut) -> ProtocolResult<()>;

/// Parses the body bytes (header excluded) of one kind
pub type DecodeFn = fn(MessageKind, &[u8]) -> ProtocolResult<Body>;

#[derive(Debug, Clone, Copy)]
pub struct KindCodec {
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

impl KindCodec {
    pub const fn new(encode: EncodeFn, decode: DecodeFn) -> Self {
        Self { encode, decode }
    }

    /// Body kept as raw bytes in both directions
    pub const fn opaque() -> Self {
        Self::new(encode_opaque, decode_opaque)
    }
}

#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<MessageKind, KindCodec>,
}

impl CodecRegistry {
    /// Registry with no kinds at all
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Structured codecs for the built-in message catalog
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        let empty = KindCodec::new(encode_empty, decode_empty);
        registry.register(MessageKind::Hello, KindCodec::new(encode_hello, decode_hello));
        registry.register(MessageKind::Error, KindCodec::new(encode_error, decode_error));
        registry.register(MessageKind::EchoRequest, KindCodec::new(encode_echo, decode_echo));
        registry.register(MessageKind::EchoReply, KindCodec::new(encode_echo, decode_echo));
        registry.register(MessageKind::FeaturesRequest, empty);
        registry.register(
            MessageKind::FeaturesReply,
            KindCodec::new(encode_features_reply, decode_features_reply),
        );
        registry.register(MessageKind::GetConfigRequest, empty);
        let switch_config = KindCodec::new(encode_switch_config, decode_switch_config);
        registry.register(MessageKind::GetConfigReply, switch_config);
        registry.register(MessageKind::SetConfig, switch_config);
        registry.register(MessageKind::FlowMod, KindCodec::new(encode_flow_mod, decode_flow_mod));
        registry.register(
            MessageKind::MultipartRequest,
            KindCodec::new(encode_multipart_request, decode_multipart_request),
        );
        registry.register(
            MessageKind::MultipartReply,
            KindCodec::new(encode_multipart_reply, decode_multipart_reply),
        );
        registry.register(MessageKind::BarrierRequest, empty);
        registry.register(MessageKind::BarrierReply, empty);
        registry
    }

    /// Install or replace the codec for `kind`
    pub fn register(&mut self, kind: MessageKind, codec: KindCodec) -> Option<KindCodec> {
        self.codecs.insert(kind, codec)
    }

    /// Accept `kind` with its body carried as raw bytes
    pub fn register_opaque(&mut self, kind: MessageKind) -> Option<KindCodec> {
        self.register(kind, KindCodec::opaque())
    }

    pub fn supports(&self, kind: MessageKind) -> bool {
        self.codecs.contains_key(&kind)
    }

    /// Serialize a complete frame; `length` is computed, an unset xid goes out as 0
    pub fn encode(&self, msg: &Message) -> ProtocolResult<Bytes> {
        let kind = msg.kind();
        let codec = self
            .codecs
            .get(&kind)
            .ok_or_else(|| ProtocolError::unsupported_kind(kind, &[]))?;

        let mut out = BytesMut::with_capacity(HEADER_SIZE + 64);
        out.put_bytes(0, HEADER_SIZE);
        (codec.encode)(&msg.body, &mut out)?;

        if out.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: out.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let header = Header::new(msg.version, kind, out.len() as u16, msg.xid.unwrap_or(0));
        out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

        trace!(%kind, xid = msg.xid.unwrap_or(0), len = out.len(), "encoded message");
        Ok(out.freeze())
    }

    /// Decode exactly one complete frame (header included)
    pub fn decode(&self, frame: &[u8]) -> ProtocolResult<Message> {
        let header = Header::parse(frame)
            .ok_or_else(|| ProtocolError::message_too_small(HEADER_SIZE, frame.len(), "header"))?;
        let length = header.length();
        if length < HEADER_SIZE {
            return Err(ProtocolError::malformed_header(length, HEADER_SIZE));
        }
        if frame.len() < length {
            return Err(ProtocolError::message_too_small(length, frame.len(), "frame"));
        }

        let kind = header
            .kind()
            .map_err(|tag| ProtocolError::unknown_kind(tag, &frame[..length]))?;
        let codec = self
            .codecs
            .get(&kind)
            .ok_or_else(|| ProtocolError::unsupported_kind(kind, &frame[..length]))?;

        let body = (codec.decode)(kind, &frame[HEADER_SIZE..length])?;
        Ok(Message {
            version: header.version,
            xid: Some(header.xid()),
            msg_len: length as u16,
            body,
            targets: Default::default(),
        })
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{OpaqueBody, SwitchFeatures};

    #[test]
    fn test_features_reply_frame_is_32_bytes() {
        let registry = CodecRegistry::builtin();
        let msg = Message::new(Body::FeaturesReply(SwitchFeatures {
            datapath_id: 1,
            ..Default::default()
        }))
        .with_xid(9);
        let frame = registry.encode(&msg).unwrap();
        assert_eq!(frame.len(), 32);
        assert_eq!(&frame[..8], &[0x04, 0x06, 0x00, 0x20, 0, 0, 0, 9]);

        let decoded = registry.decode(&frame).unwrap();
        assert_eq!(decoded.msg_len, 32);
        assert_eq!(decoded.xid, Some(9));
        assert_eq!(decoded.body, msg.body);
    }

    #[test]
    fn test_unset_xid_goes_out_as_zero() {
        let frame = CodecRegistry::builtin()
            .encode(&Message::barrier_request())
            .unwrap();
        assert_eq!(&frame[..], &[0x04, 0x14, 0x00, 0x08, 0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_kind_keeps_raw_frame() {
        let frame = [0x04, 0xc8, 0x00, 0x08, 0, 0, 0, 1];
        let err = CodecRegistry::builtin().decode(&frame).unwrap_err();
        assert_eq!(err, ProtocolError::unknown_kind(0xc8, &frame));
    }

    #[test]
    fn test_unregistered_kind_is_unsupported() {
        // PACKET_IN has no built-in codec
        let frame = [0x04, 0x0a, 0x00, 0x0a, 0, 0, 0, 1, 0xab, 0xcd];
        let err = CodecRegistry::builtin().decode(&frame).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnsupportedKind { kind: MessageKind::PacketIn, .. }
        ));
        assert_eq!(err.raw_frame(), Some(&frame[..]));
    }

    #[test]
    fn test_register_opaque_accepts_kind() {
        let mut registry = CodecRegistry::builtin();
        registry.register_opaque(MessageKind::PacketIn);
        let frame = [0x04, 0x0a, 0x00, 0x0a, 0, 0, 0, 1, 0xab, 0xcd];
        let msg = registry.decode(&frame).unwrap();
        assert_eq!(
            msg.body,
            Body::Opaque(OpaqueBody {
                kind: MessageKind::PacketIn,
                data: vec![0xab, 0xcd],
            })
        );
        assert_eq!(registry.encode(&msg).unwrap(), Bytes::copy_from_slice(&frame));
    }

    #[test]
    fn test_empty_registry_cannot_encode() {
        let err = CodecRegistry::empty().encode(&Message::hello()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedKind { .. }));
    }
}
