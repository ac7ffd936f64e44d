//! Message kind enumeration
//!
//! The kind tag is the second byte of every header. The set is closed: any
//! tag outside it is rejected by the decoder as an unknown kind.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// OpenFlow 1.3 message types (`ofp_type`)
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
pub enum MessageKind {
    Hello = 0,
    Error = 1,
    EchoRequest = 2,
    EchoReply = 3,
    Experimenter = 4,
    FeaturesRequest = 5,
    FeaturesReply = 6,
    GetConfigRequest = 7,
    GetConfigReply = 8,
    SetConfig = 9,
    PacketIn = 10,
    FlowRemoved = 11,
    PortStatus = 12,
    PacketOut = 13,
    FlowMod = 14,
    GroupMod = 15,
    PortMod = 16,
    TableMod = 17,
    MultipartRequest = 18,
    MultipartReply = 19,
    BarrierRequest = 20,
    BarrierReply = 21,
    QueueGetConfigRequest = 22,
    QueueGetConfigReply = 23,
    RoleRequest = 24,
    RoleReply = 25,
    GetAsyncRequest = 26,
    GetAsyncReply = 27,
    SetAsync = 28,
    MeterMod = 29,
}

impl MessageKind {
    /// Record name used in comparison diagnostics
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Hello => "OFPHello",
            MessageKind::Error => "OFPErrorMsg",
            MessageKind::EchoRequest => "OFPEchoRequest",
            MessageKind::EchoReply => "OFPEchoReply",
            MessageKind::Experimenter => "OFPExperimenter",
            MessageKind::FeaturesRequest => "OFPFeaturesRequest",
            MessageKind::FeaturesReply => "OFPSwitchFeatures",
            MessageKind::GetConfigRequest => "OFPGetConfigRequest",
            MessageKind::GetConfigReply => "OFPGetConfigReply",
            MessageKind::SetConfig => "OFPSetConfig",
            MessageKind::PacketIn => "OFPPacketIn",
            MessageKind::FlowRemoved => "OFPFlowRemoved",
            MessageKind::PortStatus => "OFPPortStatus",
            MessageKind::PacketOut => "OFPPacketOut",
            MessageKind::FlowMod => "OFPFlowMod",
            MessageKind::GroupMod => "OFPGroupMod",
            MessageKind::PortMod => "OFPPortMod",
            MessageKind::TableMod => "OFPTableMod",
            MessageKind::MultipartRequest => "OFPMultipartRequest",
            MessageKind::MultipartReply => "OFPMultipartReply",
            MessageKind::BarrierRequest => "OFPBarrierRequest",
            MessageKind::BarrierReply => "OFPBarrierReply",
            MessageKind::QueueGetConfigRequest => "OFPQueueGetConfigRequest",
            MessageKind::QueueGetConfigReply => "OFPQueueGetConfigReply",
            MessageKind::RoleRequest => "OFPRoleRequest",
            MessageKind::RoleReply => "OFPRoleReply",
            MessageKind::GetAsyncRequest => "OFPGetAsyncRequest",
            MessageKind::GetAsyncReply => "OFPGetAsyncReply",
            MessageKind::SetAsync => "OFPSetAsync",
            MessageKind::MeterMod => "OFPMeterMod",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
