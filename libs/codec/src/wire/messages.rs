//! Per-kind body codecs used by the built-in registry
//!
//! Every function here sees only the body: the bytes after the 8-byte
//! header on decode, and the output buffer positioned after the header on
//! encode.

use super::actions::{decode_instructions, encode_instructions};
use super::matching::{decode_match, encode_match};
use super::{patch_u16, WireReader};
use crate::error::{ProtocolError, ProtocolResult};
use bytes::{BufMut, BytesMut};
use types::{
    Body, Echo, ErrorMsg, FlowMod, FlowStats, FlowStatsRequest, Hello, MessageKind,
    MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody, OpaqueBody,
    SwitchConfig, SwitchFeatures, OFPMP_FLOW,
};

const FLOW_STATS_FIXED_SIZE: usize = 48;

fn mismatch(kind: MessageKind, body: &Body) -> ProtocolError {
    ProtocolError::invalid_payload(
        kind.name(),
        0,
        format!("codec for {} handed a {} body", kind, body.kind()),
    )
}

/// Bodiless kinds: features request, get-config request, barrier request/reply
pub fn encode_empty(_body: &Body, _out: &mut BytesMut) -> ProtocolResult<()> {
    Ok(())
}

pub fn decode_empty(kind: MessageKind, _data: &[u8]) -> ProtocolResult<Body> {
    // Trailing bytes on a bodiless kind are ignored.
    match kind {
        MessageKind::FeaturesRequest => Ok(Body::FeaturesRequest),
        MessageKind::GetConfigRequest => Ok(Body::GetConfigRequest),
        MessageKind::BarrierRequest => Ok(Body::BarrierRequest),
        MessageKind::BarrierReply => Ok(Body::BarrierReply),
        other => Err(ProtocolError::invalid_payload(
            other.name(),
            0,
            "kind has a body",
        )),
    }
}

pub fn encode_hello(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::Hello(hello) => {
            out.put_slice(&hello.elements);
            Ok(())
        }
        other => Err(mismatch(MessageKind::Hello, other)),
    }
}

pub fn decode_hello(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    Ok(Body::Hello(Hello {
        elements: data.to_vec(),
    }))
}

pub fn encode_echo(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::EchoRequest(echo) | Body::EchoReply(echo) => {
            out.put_slice(&echo.data);
            Ok(())
        }
        other => Err(mismatch(MessageKind::EchoRequest, other)),
    }
}

pub fn decode_echo(kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let echo = Echo::new(data);
    Ok(if kind == MessageKind::EchoReply {
        Body::EchoReply(echo)
    } else {
        Body::EchoRequest(echo)
    })
}

pub fn encode_error(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::Error(error) => {
            out.put_u16(error.err_type);
            out.put_u16(error.code);
            out.put_slice(&error.data);
            Ok(())
        }
        other => Err(mismatch(MessageKind::Error, other)),
    }
}

pub fn decode_error(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "error");
    let err_type = reader.u16()?;
    let code = reader.u16()?;
    Ok(Body::Error(ErrorMsg {
        err_type,
        code,
        data: reader.rest().to_vec(),
    }))
}

pub fn encode_features_reply(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::FeaturesReply(features) => {
            out.put_u64(features.datapath_id);
            out.put_u32(features.n_buffers);
            out.put_u8(features.n_tables);
            out.put_u8(features.auxiliary_id);
            out.put_bytes(0, 2);
            out.put_u32(features.capabilities);
            out.put_u32(features.reserved);
            Ok(())
        }
        other => Err(mismatch(MessageKind::FeaturesReply, other)),
    }
}

pub fn decode_features_reply(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "switch features");
    let datapath_id = reader.u64()?;
    let n_buffers = reader.u32()?;
    let n_tables = reader.u8()?;
    let auxiliary_id = reader.u8()?;
    reader.skip(2)?;
    let capabilities = reader.u32()?;
    let reserved = reader.u32()?;
    Ok(Body::FeaturesReply(SwitchFeatures {
        datapath_id,
        n_buffers,
        n_tables,
        auxiliary_id,
        capabilities,
        reserved,
    }))
}

pub fn encode_switch_config(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::GetConfigReply(config) | Body::SetConfig(config) => {
            out.put_u16(config.flags);
            out.put_u16(config.miss_send_len);
            Ok(())
        }
        other => Err(mismatch(MessageKind::SetConfig, other)),
    }
}

pub fn decode_switch_config(kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "switch config");
    let config = SwitchConfig {
        flags: reader.u16()?,
        miss_send_len: reader.u16()?,
    };
    Ok(if kind == MessageKind::SetConfig {
        Body::SetConfig(config)
    } else {
        Body::GetConfigReply(config)
    })
}

pub fn encode_flow_mod(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    let flow_mod = match body {
        Body::FlowMod(flow_mod) => flow_mod,
        other => return Err(mismatch(MessageKind::FlowMod, other)),
    };
    out.put_u64(flow_mod.cookie);
    out.put_u64(flow_mod.cookie_mask);
    out.put_u8(flow_mod.table_id);
    out.put_u8(flow_mod.command);
    out.put_u16(flow_mod.idle_timeout);
    out.put_u16(flow_mod.hard_timeout);
    out.put_u16(flow_mod.priority);
    out.put_u32(flow_mod.buffer_id);
    out.put_u32(flow_mod.out_port);
    out.put_u32(flow_mod.out_group);
    out.put_u16(flow_mod.flags);
    out.put_bytes(0, 2);
    encode_match(&flow_mod.match_, out)?;
    encode_instructions(&flow_mod.instructions, out)
}

pub fn decode_flow_mod(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "flow mod");
    let cookie = reader.u64()?;
    let cookie_mask = reader.u64()?;
    let table_id = reader.u8()?;
    let command = reader.u8()?;
    let idle_timeout = reader.u16()?;
    let hard_timeout = reader.u16()?;
    let priority = reader.u16()?;
    let buffer_id = reader.u32()?;
    let out_port = reader.u32()?;
    let out_group = reader.u32()?;
    let flags = reader.u16()?;
    reader.skip(2)?;
    let match_ = decode_match(&mut reader)?;
    let instructions = decode_instructions(&mut reader)?;
    Ok(Body::FlowMod(FlowMod {
        cookie,
        cookie_mask,
        table_id,
        command,
        idle_timeout,
        hard_timeout,
        priority,
        buffer_id,
        out_port,
        out_group,
        flags,
        match_,
        instructions,
    }))
}

fn encode_flow_stats_request(request: &FlowStatsRequest, out: &mut BytesMut) -> ProtocolResult<()> {
    out.put_u8(request.table_id);
    out.put_bytes(0, 3);
    out.put_u32(request.out_port);
    out.put_u32(request.out_group);
    out.put_bytes(0, 4);
    out.put_u64(request.cookie);
    out.put_u64(request.cookie_mask);
    encode_match(&request.match_, out)
}

fn decode_flow_stats_request(reader: &mut WireReader<'_>) -> ProtocolResult<FlowStatsRequest> {
    let table_id = reader.u8()?;
    reader.skip(3)?;
    let out_port = reader.u32()?;
    let out_group = reader.u32()?;
    reader.skip(4)?;
    let cookie = reader.u64()?;
    let cookie_mask = reader.u64()?;
    let match_ = decode_match(reader)?;
    Ok(FlowStatsRequest {
        table_id,
        out_port,
        out_group,
        cookie,
        cookie_mask,
        match_,
    })
}

pub fn encode_multipart_request(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    let request = match body {
        Body::MultipartRequest(request) => request,
        other => return Err(mismatch(MessageKind::MultipartRequest, other)),
    };
    out.put_u16(request.mp_type);
    out.put_u16(request.flags);
    out.put_bytes(0, 4);
    match &request.body {
        MultipartRequestBody::Flow(flow) => encode_flow_stats_request(flow, out),
        MultipartRequestBody::Opaque(data) => {
            out.put_slice(data);
            Ok(())
        }
    }
}

pub fn decode_multipart_request(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "multipart request");
    let mp_type = reader.u16()?;
    let flags = reader.u16()?;
    reader.skip(4)?;
    let body = if mp_type == OFPMP_FLOW {
        MultipartRequestBody::Flow(decode_flow_stats_request(&mut reader)?)
    } else {
        MultipartRequestBody::Opaque(reader.rest().to_vec())
    };
    Ok(Body::MultipartRequest(MultipartRequest {
        mp_type,
        flags,
        body,
    }))
}

fn encode_flow_stats(stats: &FlowStats, out: &mut BytesMut) -> ProtocolResult<()> {
    let start = out.len();
    out.put_u16(0);
    out.put_u8(stats.table_id);
    out.put_u8(0);
    out.put_u32(stats.duration_sec);
    out.put_u32(stats.duration_nsec);
    out.put_u16(stats.priority);
    out.put_u16(stats.idle_timeout);
    out.put_u16(stats.hard_timeout);
    out.put_u16(stats.flags);
    out.put_bytes(0, 4);
    out.put_u64(stats.cookie);
    out.put_u64(stats.packet_count);
    out.put_u64(stats.byte_count);
    encode_match(&stats.match_, out)?;
    encode_instructions(&stats.instructions, out)?;
    // Entry length is always recomputed; the `length` field is decode-only.
    patch_u16(out, start, out.len() - start)
}

fn decode_flow_stats(reader: &mut WireReader<'_>) -> ProtocolResult<FlowStats> {
    let length = reader.u16()?;
    if (length as usize) < FLOW_STATS_FIXED_SIZE {
        return Err(reader.invalid(format!(
            "flow stats length {} below fixed size {}",
            length, FLOW_STATS_FIXED_SIZE
        )));
    }
    let mut entry = reader.sub(length as usize - 2, "flow stats")?;
    let table_id = entry.u8()?;
    entry.skip(1)?;
    let duration_sec = entry.u32()?;
    let duration_nsec = entry.u32()?;
    let priority = entry.u16()?;
    let idle_timeout = entry.u16()?;
    let hard_timeout = entry.u16()?;
    let flags = entry.u16()?;
    entry.skip(4)?;
    let cookie = entry.u64()?;
    let packet_count = entry.u64()?;
    let byte_count = entry.u64()?;
    let match_ = decode_match(&mut entry)?;
    let instructions = decode_instructions(&mut entry)?;
    Ok(FlowStats {
        length,
        table_id,
        duration_sec,
        duration_nsec,
        priority,
        idle_timeout,
        hard_timeout,
        flags,
        cookie,
        packet_count,
        byte_count,
        match_,
        instructions,
        ..Default::default()
    })
}

pub fn encode_multipart_reply(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    let reply = match body {
        Body::MultipartReply(reply) => reply,
        other => return Err(mismatch(MessageKind::MultipartReply, other)),
    };
    out.put_u16(reply.mp_type);
    out.put_u16(reply.flags);
    out.put_bytes(0, 4);
    match &reply.body {
        MultipartReplyBody::Flow(entries) => {
            for stats in entries {
                encode_flow_stats(stats, out)?;
            }
            Ok(())
        }
        MultipartReplyBody::Opaque(data) => {
            out.put_slice(data);
            Ok(())
        }
    }
}

pub fn decode_multipart_reply(_kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    let mut reader = WireReader::new(data, "multipart reply");
    let mp_type = reader.u16()?;
    let flags = reader.u16()?;
    reader.skip(4)?;
    let body = if mp_type == OFPMP_FLOW {
        let mut entries = Vec::new();
        while !reader.is_empty() {
            entries.push(decode_flow_stats(&mut reader)?);
        }
        MultipartReplyBody::Flow(entries)
    } else {
        MultipartReplyBody::Opaque(reader.rest().to_vec())
    };
    Ok(Body::MultipartReply(MultipartReply {
        mp_type,
        flags,
        body,
    }))
}

/// Pass-through codec for kinds registered without a structured layout
pub fn encode_opaque(body: &Body, out: &mut BytesMut) -> ProtocolResult<()> {
    match body {
        Body::Opaque(opaque) => {
            out.put_slice(&opaque.data);
            Ok(())
        }
        other => Err(ProtocolError::invalid_payload(
            "opaque",
            0,
            format!("pass-through codec handed a structured {} body", other.kind()),
        )),
    }
}

pub fn decode_opaque(kind: MessageKind, data: &[u8]) -> ProtocolResult<Body> {
    Ok(Body::Opaque(OpaqueBody {
        kind,
        data: data.to_vec(),
    }))
}
