//! Controller-to-switch and symmetric message bodies
//!
//! Hello, echo, error, features, switch configuration, plus the opaque body
//! used for kinds registered without a structured codec.

use crate::protocol::kind::MessageKind;
use crate::record::{Record, Stringify, Value};

/// `OFPT_HELLO`; hello elements are kept verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hello {
    pub elements: Vec<u8>,
}

impl Stringify for Hello {
    fn to_record(&self) -> Record {
        Record::new("OFPHello").attr("elements", Value::bytes(self.elements.clone()))
    }
}

/// Echo request / reply payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Echo {
    pub data: Vec<u8>,
}

impl Echo {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl Stringify for Echo {
    fn to_record(&self) -> Record {
        Record::new("OFPEcho").attr("data", Value::bytes(self.data.clone()))
    }
}

/// `OFPT_ERROR`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorMsg {
    pub err_type: u16,
    pub code: u16,
    pub data: Vec<u8>,
}

impl Stringify for ErrorMsg {
    fn to_record(&self) -> Record {
        Record::new("OFPErrorMsg")
            .attr("type", self.err_type)
            .attr("code", self.code)
            .attr("data", Value::bytes(self.data.clone()))
    }
}

/// `OFPT_FEATURES_REPLY`; `datapath_id` is the switch's identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchFeatures {
    pub datapath_id: u64,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub auxiliary_id: u8,
    pub capabilities: u32,
    pub reserved: u32,
}

impl Stringify for SwitchFeatures {
    fn to_record(&self) -> Record {
        Record::new("OFPSwitchFeatures")
            .attr("datapath_id", self.datapath_id)
            .attr("n_buffers", self.n_buffers)
            .attr("n_tables", self.n_tables)
            .attr("auxiliary_id", self.auxiliary_id)
            .attr("capabilities", self.capabilities)
    }
}

/// Body of `OFPT_GET_CONFIG_REPLY` and `OFPT_SET_CONFIG`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchConfig {
    pub flags: u16,
    pub miss_send_len: u16,
}

impl Stringify for SwitchConfig {
    fn to_record(&self) -> Record {
        Record::new("OFPSwitchConfig")
            .attr("flags", self.flags)
            .attr("miss_send_len", self.miss_send_len)
    }
}

/// Body of a kind that was registered as pass-through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBody {
    pub kind: MessageKind,
    pub data: Vec<u8>,
}

impl Stringify for OpaqueBody {
    fn to_record(&self) -> Record {
        Record::new(self.kind.name()).attr("data", Value::bytes(self.data.clone()))
    }
}
