//! Instruction and action list codecs

use super::matching::{decode_oxm, encode_oxm, oxm_len};
use super::{align8, pad_from, patch_u16, WireReader};
use crate::error::ProtocolResult;
use bytes::{BufMut, BytesMut};
use types::protocol::actions::{
    OFPAT_GROUP, OFPAT_OUTPUT, OFPAT_POP_VLAN, OFPAT_PUSH_VLAN, OFPAT_SET_FIELD, OFPAT_SET_QUEUE,
    OFPIT_APPLY_ACTIONS, OFPIT_CLEAR_ACTIONS, OFPIT_GOTO_TABLE, OFPIT_WRITE_ACTIONS,
    OFPIT_WRITE_METADATA,
};
use types::{Action, Instruction};

const TLV_HEADER_SIZE: usize = 4;

pub fn encode_action(action: &Action, out: &mut BytesMut) -> ProtocolResult<()> {
    let start = out.len();
    out.put_u16(action.kind());
    let length_at = out.len();
    out.put_u16(0);
    match action {
        Action::Output { port, max_len } => {
            out.put_u32(*port);
            out.put_u16(*max_len);
            out.put_bytes(0, 6);
        }
        Action::PushVlan { ethertype } => {
            out.put_u16(*ethertype);
            out.put_bytes(0, 2);
        }
        Action::PopVlan => out.put_bytes(0, 4),
        Action::SetQueue { queue_id } => out.put_u32(*queue_id),
        Action::Group { group_id } => out.put_u32(*group_id),
        Action::SetField(field) => {
            encode_oxm(field, out)?;
            let unpadded = TLV_HEADER_SIZE + oxm_len(field);
            out.put_bytes(0, align8(unpadded) - unpadded);
        }
        Action::Opaque { data, .. } => out.put_slice(data),
    }
    patch_u16(out, length_at, out.len() - start)
}

fn decode_action(reader: &mut WireReader<'_>) -> ProtocolResult<Action> {
    let kind = reader.u16()?;
    let length = reader.u16()? as usize;
    if length < TLV_HEADER_SIZE {
        return Err(reader.invalid(format!("action length {} below header size", length)));
    }
    let mut body = reader.sub(length - TLV_HEADER_SIZE, "action")?;
    let action = match kind {
        OFPAT_OUTPUT => {
            let port = body.u32()?;
            let max_len = body.u16()?;
            Action::Output { port, max_len }
        }
        OFPAT_PUSH_VLAN => Action::PushVlan {
            ethertype: body.u16()?,
        },
        OFPAT_POP_VLAN => Action::PopVlan,
        OFPAT_SET_QUEUE => Action::SetQueue {
            queue_id: body.u32()?,
        },
        OFPAT_GROUP => Action::Group {
            group_id: body.u32()?,
        },
        OFPAT_SET_FIELD => Action::SetField(decode_oxm(&mut body)?),
        _ => Action::Opaque {
            kind,
            data: body.rest().to_vec(),
        },
    };
    Ok(action)
}

pub(crate) fn decode_actions(reader: &mut WireReader<'_>) -> ProtocolResult<Vec<Action>> {
    let mut actions = Vec::new();
    while !reader.is_empty() {
        actions.push(decode_action(reader)?);
    }
    Ok(actions)
}

pub fn encode_instruction(instruction: &Instruction, out: &mut BytesMut) -> ProtocolResult<()> {
    let start = out.len();
    out.put_u16(instruction.kind());
    let length_at = out.len();
    out.put_u16(0);
    match instruction {
        Instruction::GotoTable { table_id } => {
            out.put_u8(*table_id);
            out.put_bytes(0, 3);
        }
        Instruction::WriteMetadata {
            metadata,
            metadata_mask,
        } => {
            out.put_bytes(0, 4);
            out.put_u64(*metadata);
            out.put_u64(*metadata_mask);
        }
        Instruction::WriteActions(actions) | Instruction::ApplyActions(actions) => {
            out.put_bytes(0, 4);
            for action in actions {
                encode_action(action, out)?;
            }
        }
        Instruction::ClearActions => out.put_bytes(0, 4),
        Instruction::Opaque { data, .. } => {
            out.put_slice(data);
            pad_from(out, start);
        }
    }
    patch_u16(out, length_at, out.len() - start)
}

fn decode_instruction(reader: &mut WireReader<'_>) -> ProtocolResult<Instruction> {
    let kind = reader.u16()?;
    let length = reader.u16()? as usize;
    if length < TLV_HEADER_SIZE {
        return Err(reader.invalid(format!("instruction length {} below header size", length)));
    }
    let mut body = reader.sub(length - TLV_HEADER_SIZE, "instruction")?;
    let instruction = match kind {
        OFPIT_GOTO_TABLE => Instruction::GotoTable {
            table_id: body.u8()?,
        },
        OFPIT_WRITE_METADATA => {
            body.skip(4)?;
            let metadata = body.u64()?;
            let metadata_mask = body.u64()?;
            Instruction::WriteMetadata {
                metadata,
                metadata_mask,
            }
        }
        OFPIT_WRITE_ACTIONS | OFPIT_APPLY_ACTIONS => {
            body.skip(4)?;
            let actions = decode_actions(&mut body)?;
            if kind == OFPIT_WRITE_ACTIONS {
                Instruction::WriteActions(actions)
            } else {
                Instruction::ApplyActions(actions)
            }
        }
        OFPIT_CLEAR_ACTIONS => Instruction::ClearActions,
        _ => Instruction::Opaque {
            kind,
            data: body.rest().to_vec(),
        },
    };
    Ok(instruction)
}

pub fn encode_instructions(instructions: &[Instruction], out: &mut BytesMut) -> ProtocolResult<()> {
    for instruction in instructions {
        encode_instruction(instruction, out)?;
    }
    Ok(())
}

pub(crate) fn decode_instructions(reader: &mut WireReader<'_>) -> ProtocolResult<Vec<Instruction>> {
    let mut instructions = Vec::new();
    while !reader.is_empty() {
        instructions.push(decode_instruction(reader)?);
    }
    Ok(instructions)
}
