//! `ofp_match` / OXM TLV codec
//!
//! Encoding always emits the canonical layout: fields sorted by
//! `(class, field)` and full-width masks dropped. Decoding keeps whatever
//! order the peer sent, so encode→decode of any match yields its canonical form.

use super::{align8, pad_from, patch_u16, WireReader};
use crate::error::ProtocolResult;
use bytes::{BufMut, BytesMut};
use types::{Match, OxmField, OFPMT_OXM};

const OXM_HEADER_SIZE: usize = 4;
const MATCH_HEADER_SIZE: usize = 4;

/// Fields of `m` in canonical form
pub fn canonical_fields(m: &Match) -> Vec<OxmField> {
    let mut fields: Vec<OxmField> = m
        .fields
        .iter()
        .map(|field| {
            let full_mask = field
                .mask
                .as_ref()
                .map_or(false, |mask| mask.len() == field.value.len() && mask.iter().all(|b| *b == 0xff));
            if full_mask {
                OxmField {
                    mask: None,
                    ..field.clone()
                }
            } else {
                field.clone()
            }
        })
        .collect();
    fields.sort_by_key(OxmField::order_key);
    fields
}

/// Serialize then re-parse; used as the comparison normalization hook
pub fn normalize_match(m: &Match) -> ProtocolResult<Match> {
    let mut out = BytesMut::new();
    encode_match(m, &mut out)?;
    let mut reader = WireReader::new(&out, "match");
    decode_match(&mut reader)
}

pub fn encode_oxm(field: &OxmField, out: &mut BytesMut) -> ProtocolResult<()> {
    let mask_len = field.mask.as_ref().map_or(0, Vec::len);
    let payload = field.value.len() + mask_len;
    let payload = u8::try_from(payload).map_err(|_| {
        crate::error::ProtocolError::invalid_payload(
            "oxm field",
            out.len(),
            format!("value+mask of {} bytes exceeds 255", payload),
        )
    })?;
    out.put_u16(field.class);
    out.put_u8((field.field << 1) | u8::from(field.mask.is_some()));
    out.put_u8(payload);
    out.put_slice(&field.value);
    if let Some(mask) = &field.mask {
        out.put_slice(mask);
    }
    Ok(())
}

pub(crate) fn decode_oxm(reader: &mut WireReader<'_>) -> ProtocolResult<OxmField> {
    let class = reader.u16()?;
    let field_and_mask = reader.u8()?;
    let length = reader.u8()? as usize;
    let has_mask = field_and_mask & 1 == 1;
    if has_mask && length % 2 != 0 {
        return Err(reader.invalid(format!("masked oxm with odd length {}", length)));
    }
    let value_len = if has_mask { length / 2 } else { length };
    let value = reader.take(value_len)?.to_vec();
    let mask = if has_mask {
        Some(reader.take(value_len)?.to_vec())
    } else {
        None
    };
    Ok(OxmField {
        class,
        field: field_and_mask >> 1,
        value,
        mask,
    })
}

/// Encoded size of the fields alone (no match header, no padding)
pub(crate) fn oxm_len(field: &OxmField) -> usize {
    OXM_HEADER_SIZE + field.value.len() + field.mask.as_ref().map_or(0, Vec::len)
}

pub fn encode_match(m: &Match, out: &mut BytesMut) -> ProtocolResult<()> {
    let start = out.len();
    out.put_u16(OFPMT_OXM);
    let length_at = out.len();
    out.put_u16(0);
    for field in canonical_fields(m) {
        encode_oxm(&field, out)?;
    }
    patch_u16(out, length_at, out.len() - start)?;
    pad_from(out, start);
    Ok(())
}

pub(crate) fn decode_match(reader: &mut WireReader<'_>) -> ProtocolResult<Match> {
    let match_type = reader.u16()?;
    if match_type != OFPMT_OXM {
        return Err(reader.invalid(format!("unsupported match type {}", match_type)));
    }
    let length = reader.u16()? as usize;
    if length < MATCH_HEADER_SIZE {
        return Err(reader.invalid(format!("match length {} below header size", length)));
    }
    let mut fields_reader = reader.sub(length - MATCH_HEADER_SIZE, "oxm fields")?;
    let mut fields = Vec::new();
    while !fields_reader.is_empty() {
        fields.push(decode_oxm(&mut fields_reader)?);
    }
    reader.skip(align8(length) - length)?;
    Ok(Match { fields })
}
