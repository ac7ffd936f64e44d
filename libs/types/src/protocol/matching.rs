//! OXM flow match
//!
//! A `Match` is an ordered list of OXM TLV fields. The same match can be
//! expressed by several byte layouts (field order, full-width masks), which
//! is why the comparison engine normalizes matches before comparing them.

use crate::protocol::constants::OFPXMC_OPENFLOW_BASIC;
use crate::record::{Record, Stringify, Value};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::borrow::Cow;

/// OpenFlow basic OXM field numbers
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum OxmBasic {
    InPort = 0,
    InPhyPort = 1,
    Metadata = 2,
    EthDst = 3,
    EthSrc = 4,
    EthType = 5,
    VlanVid = 6,
    VlanPcp = 7,
    IpDscp = 8,
    IpEcn = 9,
    IpProto = 10,
    Ipv4Src = 11,
    Ipv4Dst = 12,
    TcpSrc = 13,
    TcpDst = 14,
    UdpSrc = 15,
    UdpDst = 16,
}

impl OxmBasic {
    pub fn name(self) -> &'static str {
        match self {
            OxmBasic::InPort => "in_port",
            OxmBasic::InPhyPort => "in_phy_port",
            OxmBasic::Metadata => "metadata",
            OxmBasic::EthDst => "eth_dst",
            OxmBasic::EthSrc => "eth_src",
            OxmBasic::EthType => "eth_type",
            OxmBasic::VlanVid => "vlan_vid",
            OxmBasic::VlanPcp => "vlan_pcp",
            OxmBasic::IpDscp => "ip_dscp",
            OxmBasic::IpEcn => "ip_ecn",
            OxmBasic::IpProto => "ip_proto",
            OxmBasic::Ipv4Src => "ipv4_src",
            OxmBasic::Ipv4Dst => "ipv4_dst",
            OxmBasic::TcpSrc => "tcp_src",
            OxmBasic::TcpDst => "tcp_dst",
            OxmBasic::UdpSrc => "udp_src",
            OxmBasic::UdpDst => "udp_dst",
        }
    }

    /// Value width in bytes
    pub fn width(self) -> usize {
        match self {
            OxmBasic::InPort | OxmBasic::InPhyPort => 4,
            OxmBasic::Metadata => 8,
            OxmBasic::EthDst | OxmBasic::EthSrc => 6,
            OxmBasic::EthType | OxmBasic::VlanVid => 2,
            OxmBasic::VlanPcp | OxmBasic::IpDscp | OxmBasic::IpEcn | OxmBasic::IpProto => 1,
            OxmBasic::Ipv4Src | OxmBasic::Ipv4Dst => 4,
            OxmBasic::TcpSrc | OxmBasic::TcpDst | OxmBasic::UdpSrc | OxmBasic::UdpDst => 2,
        }
    }
}

/// One OXM TLV: class, field number, value and optional mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OxmField {
    pub class: u16,
    pub field: u8,
    pub value: Vec<u8>,
    pub mask: Option<Vec<u8>>,
}

impl OxmField {
    pub fn basic(field: OxmBasic, value: impl Into<Vec<u8>>) -> Self {
        Self {
            class: OFPXMC_OPENFLOW_BASIC,
            field: field.into(),
            value: value.into(),
            mask: None,
        }
    }

    pub fn masked(field: OxmBasic, value: impl Into<Vec<u8>>, mask: impl Into<Vec<u8>>) -> Self {
        Self {
            mask: Some(mask.into()),
            ..Self::basic(field, value)
        }
    }

    /// Basic field descriptor, if this is a known basic-class field
    pub fn basic_field(&self) -> Option<OxmBasic> {
        if self.class != OFPXMC_OPENFLOW_BASIC {
            return None;
        }
        OxmBasic::try_from(self.field).ok()
    }

    pub fn name(&self) -> Cow<'static, str> {
        match self.basic_field() {
            Some(field) => Cow::Borrowed(field.name()),
            None => Cow::Owned(format!("oxm_{:04x}_{}", self.class, self.field)),
        }
    }

    /// Sort key giving the canonical wire order
    pub fn order_key(&self) -> (u16, u8) {
        (self.class, self.field)
    }

    fn render(data: &[u8]) -> Value {
        if data.len() <= 8 {
            Value::Int(data.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
        } else {
            Value::bytes(data)
        }
    }

    pub fn to_value(&self) -> Value {
        match &self.mask {
            Some(mask) => Value::List(vec![Self::render(&self.value), Self::render(mask)]),
            None => Self::render(&self.value),
        }
    }
}

/// `ofp_match` with OXM fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub fields: Vec<OxmField>,
}

impl Match {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(mut self, field: OxmField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn in_port(self, port: u32) -> Self {
        self.field(OxmField::basic(OxmBasic::InPort, port.to_be_bytes()))
    }

    pub fn eth_dst(self, addr: [u8; 6]) -> Self {
        self.field(OxmField::basic(OxmBasic::EthDst, addr))
    }

    pub fn eth_src(self, addr: [u8; 6]) -> Self {
        self.field(OxmField::basic(OxmBasic::EthSrc, addr))
    }

    pub fn eth_type(self, ethertype: u16) -> Self {
        self.field(OxmField::basic(OxmBasic::EthType, ethertype.to_be_bytes()))
    }

    pub fn vlan_vid(self, vid: u16) -> Self {
        self.field(OxmField::basic(OxmBasic::VlanVid, vid.to_be_bytes()))
    }

    pub fn ip_proto(self, proto: u8) -> Self {
        self.field(OxmField::basic(OxmBasic::IpProto, [proto]))
    }

    pub fn ipv4_src(self, addr: [u8; 4]) -> Self {
        self.field(OxmField::basic(OxmBasic::Ipv4Src, addr))
    }

    pub fn ipv4_dst(self, addr: [u8; 4]) -> Self {
        self.field(OxmField::basic(OxmBasic::Ipv4Dst, addr))
    }

    pub fn metadata(self, value: u64, mask: Option<u64>) -> Self {
        match mask {
            Some(mask) => self.field(OxmField::masked(
                OxmBasic::Metadata,
                value.to_be_bytes(),
                mask.to_be_bytes(),
            )),
            None => self.field(OxmField::basic(OxmBasic::Metadata, value.to_be_bytes())),
        }
    }
}

impl Stringify for Match {
    fn to_record(&self) -> Record {
        let mut record = Record::new("OFPMatch");
        for field in &self.fields {
            record.push(field.name(), field.to_value());
        }
        record
    }
}
