//! Message and body definitions
//!
//! `Message` is the unit exchanged with the switch under test: header
//! attributes, a typed `Body` and the comparison targets attached to it.
//! The kind of a message is always derived from its body variant, so a
//! message can never claim one kind while carrying another kind's body.

pub mod controller;
pub mod flow;
pub mod header;

use crate::protocol::constants::OFP_VERSION;
use crate::protocol::kind::MessageKind;
use crate::record::{Record, Stringify};
use crate::targets::TargetSet;
use controller::{Echo, ErrorMsg, Hello, OpaqueBody, SwitchConfig, SwitchFeatures};
use flow::{FlowMod, MultipartReply, MultipartRequest};

/// Typed message body, one variant per kind with a codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Hello(Hello),
    Error(ErrorMsg),
    EchoRequest(Echo),
    EchoReply(Echo),
    FeaturesRequest,
    FeaturesReply(SwitchFeatures),
    GetConfigRequest,
    GetConfigReply(SwitchConfig),
    SetConfig(SwitchConfig),
    FlowMod(FlowMod),
    MultipartRequest(MultipartRequest),
    MultipartReply(MultipartReply),
    BarrierRequest,
    BarrierReply,
    Opaque(OpaqueBody),
}

impl Body {
    pub fn kind(&self) -> MessageKind {
        match self {
            Body::Hello(_) => MessageKind::Hello,
            Body::Error(_) => MessageKind::Error,
            Body::EchoRequest(_) => MessageKind::EchoRequest,
            Body::EchoReply(_) => MessageKind::EchoReply,
            Body::FeaturesRequest => MessageKind::FeaturesRequest,
            Body::FeaturesReply(_) => MessageKind::FeaturesReply,
            Body::GetConfigRequest => MessageKind::GetConfigRequest,
            Body::GetConfigReply(_) => MessageKind::GetConfigReply,
            Body::SetConfig(_) => MessageKind::SetConfig,
            Body::FlowMod(_) => MessageKind::FlowMod,
            Body::MultipartRequest(_) => MessageKind::MultipartRequest,
            Body::MultipartReply(_) => MessageKind::MultipartReply,
            Body::BarrierRequest => MessageKind::BarrierRequest,
            Body::BarrierReply => MessageKind::BarrierReply,
            Body::Opaque(body) => body.kind,
        }
    }

    /// Body attributes; bodiless kinds render an empty record
    fn attrs(&self) -> Option<Record> {
        match self {
            Body::Hello(body) => Some(body.to_record()),
            Body::Error(body) => Some(body.to_record()),
            Body::EchoRequest(body) | Body::EchoReply(body) => Some(body.to_record()),
            Body::FeaturesReply(body) => Some(body.to_record()),
            Body::GetConfigReply(body) | Body::SetConfig(body) => Some(body.to_record()),
            Body::FlowMod(body) => Some(body.to_record()),
            Body::MultipartRequest(body) => Some(body.to_record()),
            Body::MultipartReply(body) => Some(body.to_record()),
            Body::Opaque(body) => Some(body.to_record()),
            Body::FeaturesRequest
            | Body::GetConfigRequest
            | Body::BarrierRequest
            | Body::BarrierReply => None,
        }
    }
}

/// A protocol message with its comparison metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: u8,
    /// Assigned at send time when `None`
    pub xid: Option<u32>,
    /// Wire length after decode, or the expected length (0 = unset)
    pub msg_len: u16,
    pub body: Body,
    pub targets: TargetSet,
}

impl Message {
    pub fn new(body: Body) -> Self {
        Self {
            version: OFP_VERSION,
            xid: None,
            msg_len: 0,
            body,
            targets: TargetSet::new(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn with_xid(mut self, xid: u32) -> Self {
        self.xid = Some(xid);
        self
    }

    pub fn with_msg_len(mut self, msg_len: u16) -> Self {
        self.msg_len = msg_len;
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().collect();
        self
    }

    pub fn hello() -> Self {
        Self::new(Body::Hello(Hello::default()))
    }

    pub fn features_request() -> Self {
        Self::new(Body::FeaturesRequest)
    }

    pub fn echo_request(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Body::EchoRequest(Echo::new(data)))
    }

    pub fn barrier_request() -> Self {
        Self::new(Body::BarrierRequest)
    }
}

impl Stringify for Message {
    /// Header attributes followed by the body attributes
    fn to_record(&self) -> Record {
        let kind = self.kind();
        let mut record = Record::new(kind.name())
            .attr("version", self.version)
            .attr("msg_type", u8::from(kind))
            .attr("msg_len", self.msg_len)
            .attr("xid", self.xid)
            .with_targets(self.targets.clone());
        if let Some(body) = self.body.attrs() {
            record.attrs.extend(body.attrs);
        }
        record
    }
}
