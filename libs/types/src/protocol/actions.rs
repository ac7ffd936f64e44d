//! Flow instructions and actions

use crate::protocol::matching::OxmField;
use crate::record::{Record, Stringify, Value};

/// Instruction types (`ofp_instruction_type`)
pub const OFPIT_GOTO_TABLE: u16 = 1;
pub const OFPIT_WRITE_METADATA: u16 = 2;
pub const OFPIT_WRITE_ACTIONS: u16 = 3;
pub const OFPIT_APPLY_ACTIONS: u16 = 4;
pub const OFPIT_CLEAR_ACTIONS: u16 = 5;

/// Action types (`ofp_action_type`)
pub const OFPAT_OUTPUT: u16 = 0;
pub const OFPAT_PUSH_VLAN: u16 = 17;
pub const OFPAT_POP_VLAN: u16 = 18;
pub const OFPAT_SET_QUEUE: u16 = 21;
pub const OFPAT_GROUP: u16 = 22;
pub const OFPAT_SET_FIELD: u16 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    GotoTable { table_id: u8 },
    WriteMetadata { metadata: u64, metadata_mask: u64 },
    WriteActions(Vec<Action>),
    ApplyActions(Vec<Action>),
    ClearActions,
    /// Instruction type without a structured codec; body kept verbatim
    Opaque { kind: u16, data: Vec<u8> },
}

impl Instruction {
    pub fn kind(&self) -> u16 {
        match self {
            Instruction::GotoTable { .. } => OFPIT_GOTO_TABLE,
            Instruction::WriteMetadata { .. } => OFPIT_WRITE_METADATA,
            Instruction::WriteActions(_) => OFPIT_WRITE_ACTIONS,
            Instruction::ApplyActions(_) => OFPIT_APPLY_ACTIONS,
            Instruction::ClearActions => OFPIT_CLEAR_ACTIONS,
            Instruction::Opaque { kind, .. } => *kind,
        }
    }
}

impl Stringify for Instruction {
    fn to_record(&self) -> Record {
        match self {
            Instruction::GotoTable { table_id } => {
                Record::new("OFPInstructionGotoTable").attr("table_id", *table_id)
            }
            Instruction::WriteMetadata {
                metadata,
                metadata_mask,
            } => Record::new("OFPInstructionWriteMetadata")
                .attr("metadata", *metadata)
                .attr("metadata_mask", *metadata_mask),
            Instruction::WriteActions(actions) | Instruction::ApplyActions(actions) => {
                Record::new("OFPInstructionActions")
                    .attr("type", self.kind())
                    .attr("actions", Value::records(actions))
            }
            Instruction::ClearActions => {
                Record::new("OFPInstructionActions").attr("type", OFPIT_CLEAR_ACTIONS)
            }
            Instruction::Opaque { kind, data } => Record::new("OFPInstruction")
                .attr("type", *kind)
                .attr("data", Value::bytes(data.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Output { port: u32, max_len: u16 },
    PushVlan { ethertype: u16 },
    PopVlan,
    SetQueue { queue_id: u32 },
    Group { group_id: u32 },
    SetField(OxmField),
    /// Action type without a structured codec; body kept verbatim
    Opaque { kind: u16, data: Vec<u8> },
}

impl Action {
    pub fn output(port: u32) -> Self {
        Action::Output { port, max_len: 0 }
    }

    pub fn kind(&self) -> u16 {
        match self {
            Action::Output { .. } => OFPAT_OUTPUT,
            Action::PushVlan { .. } => OFPAT_PUSH_VLAN,
            Action::PopVlan => OFPAT_POP_VLAN,
            Action::SetQueue { .. } => OFPAT_SET_QUEUE,
            Action::Group { .. } => OFPAT_GROUP,
            Action::SetField(_) => OFPAT_SET_FIELD,
            Action::Opaque { kind, .. } => *kind,
        }
    }
}

impl Stringify for Action {
    fn to_record(&self) -> Record {
        match self {
            Action::Output { port, max_len } => Record::new("OFPActionOutput")
                .attr("port", *port)
                .attr("max_len", *max_len),
            Action::PushVlan { ethertype } => {
                Record::new("OFPActionPushVlan").attr("ethertype", *ethertype)
            }
            Action::PopVlan => Record::new("OFPActionPopVlan"),
            Action::SetQueue { queue_id } => {
                Record::new("OFPActionSetQueue").attr("queue_id", *queue_id)
            }
            Action::Group { group_id } => Record::new("OFPActionGroup").attr("group_id", *group_id),
            Action::SetField(field) => Record::new("OFPActionSetField").attr(field.name(), field.to_value()),
            Action::Opaque { kind, data } => Record::new("OFPAction")
                .attr("type", *kind)
                .attr("data", Value::bytes(data.clone())),
        }
    }
}
