//! Flow table bodies: flow mod, flow stats request and reply
//!
//! Flow stats replies carry a list of `FlowStats` entries; each entry has
//! its own `TargetSet` because scenarios usually pin only a few of its fields
//! (priority, match, instructions) and leave counters and durations open.

use crate::protocol::actions::Instruction;
use crate::protocol::constants::{
    OFPFC_ADD, OFPG_ANY, OFPMP_FLOW, OFPP_ANY, OFPTT_ALL, OFP_NO_BUFFER,
};
use crate::protocol::matching::Match;
use crate::record::{Record, Stringify, Value};
use crate::targets::TargetSet;

/// `OFPT_FLOW_MOD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    pub cookie: u64,
    pub cookie_mask: u64,
    pub table_id: u8,
    pub command: u8,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u32,
    pub out_group: u32,
    pub flags: u16,
    pub match_: Match,
    pub instructions: Vec<Instruction>,
}

impl FlowMod {
    /// Add command into table 0 with wildcard port/group and no buffer
    pub fn add() -> Self {
        Self {
            cookie: 0,
            cookie_mask: 0,
            table_id: 0,
            command: OFPFC_ADD,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 0,
            buffer_id: OFP_NO_BUFFER,
            out_port: OFPP_ANY,
            out_group: OFPG_ANY,
            flags: 0,
            match_: Match::new(),
            instructions: Vec::new(),
        }
    }
}

impl Stringify for FlowMod {
    fn to_record(&self) -> Record {
        Record::new("OFPFlowMod")
            .attr("cookie", self.cookie)
            .attr("cookie_mask", self.cookie_mask)
            .attr("table_id", self.table_id)
            .attr("command", self.command)
            .attr("idle_timeout", self.idle_timeout)
            .attr("hard_timeout", self.hard_timeout)
            .attr("priority", self.priority)
            .attr("buffer_id", self.buffer_id)
            .attr("out_port", self.out_port)
            .attr("out_group", self.out_group)
            .attr("flags", self.flags)
            .attr("match", self.match_.to_record())
            .attr("instructions", Value::records(&self.instructions))
    }
}

/// Body of an `OFPMP_FLOW` multipart request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStatsRequest {
    pub table_id: u8,
    pub out_port: u32,
    pub out_group: u32,
    pub cookie: u64,
    pub cookie_mask: u64,
    pub match_: Match,
}

impl Default for FlowStatsRequest {
    fn default() -> Self {
        Self {
            table_id: OFPTT_ALL,
            out_port: OFPP_ANY,
            out_group: OFPG_ANY,
            cookie: 0,
            cookie_mask: 0,
            match_: Match::new(),
        }
    }
}

impl Stringify for FlowStatsRequest {
    fn to_record(&self) -> Record {
        Record::new("OFPFlowStatsRequest")
            .attr("table_id", self.table_id)
            .attr("out_port", self.out_port)
            .attr("out_group", self.out_group)
            .attr("cookie", self.cookie)
            .attr("cookie_mask", self.cookie_mask)
            .attr("match", self.match_.to_record())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartRequestBody {
    Flow(FlowStatsRequest),
    /// Any other multipart type, body kept verbatim
    Opaque(Vec<u8>),
}

/// `OFPT_MULTIPART_REQUEST`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartRequest {
    pub mp_type: u16,
    pub flags: u16,
    pub body: MultipartRequestBody,
}

impl MultipartRequest {
    pub fn flow(request: FlowStatsRequest) -> Self {
        Self {
            mp_type: OFPMP_FLOW,
            flags: 0,
            body: MultipartRequestBody::Flow(request),
        }
    }
}

impl Stringify for MultipartRequest {
    fn to_record(&self) -> Record {
        let body = match &self.body {
            MultipartRequestBody::Flow(request) => Value::Record(request.to_record()),
            MultipartRequestBody::Opaque(data) => Value::bytes(data.clone()),
        };
        Record::new("OFPMultipartRequest")
            .attr("type", self.mp_type)
            .attr("flags", self.flags)
            .attr("body", body)
    }
}

/// One entry of an `OFPMP_FLOW` reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowStats {
    /// Entry length on the wire; filled in by the decoder
    pub length: u16,
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub priority: u16,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub flags: u16,
    pub cookie: u64,
    pub packet_count: u64,
    pub byte_count: u64,
    pub match_: Match,
    pub instructions: Vec<Instruction>,
    pub targets: TargetSet,
}

impl FlowStats {
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().collect();
        self
    }
}

impl Stringify for FlowStats {
    fn to_record(&self) -> Record {
        Record::new("OFPFlowStats")
            .attr("length", self.length)
            .attr("table_id", self.table_id)
            .attr("duration_sec", self.duration_sec)
            .attr("duration_nsec", self.duration_nsec)
            .attr("priority", self.priority)
            .attr("idle_timeout", self.idle_timeout)
            .attr("hard_timeout", self.hard_timeout)
            .attr("flags", self.flags)
            .attr("cookie", self.cookie)
            .attr("packet_count", self.packet_count)
            .attr("byte_count", self.byte_count)
            .attr("match", self.match_.to_record())
            .attr("instructions", Value::records(&self.instructions))
            .with_targets(self.targets.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartReplyBody {
    Flow(Vec<FlowStats>),
    /// Any other multipart type, body kept verbatim
    Opaque(Vec<u8>),
}

/// `OFPT_MULTIPART_REPLY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartReply {
    pub mp_type: u16,
    pub flags: u16,
    pub body: MultipartReplyBody,
}

impl MultipartReply {
    pub fn flow(stats: Vec<FlowStats>) -> Self {
        Self {
            mp_type: OFPMP_FLOW,
            flags: 0,
            body: MultipartReplyBody::Flow(stats),
        }
    }
}

impl Stringify for MultipartReply {
    fn to_record(&self) -> Record {
        let body = match &self.body {
            MultipartReplyBody::Flow(stats) => Value::records(stats),
            MultipartReplyBody::Opaque(data) => Value::bytes(data.clone()),
        };
        Record::new("OFPMultipartReply")
            .attr("type", self.mp_type)
            .attr("flags", self.flags)
            .attr("body", body)
    }
}
