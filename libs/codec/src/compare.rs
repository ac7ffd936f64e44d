//! # Structural Comparison Engine
//!
//! Judges whether a received message matches an expectation, looking only at
//! the fields named by the targets attached to either side.
//!
//! ## Algorithm
//!
//! 1. Run the per-kind normalization hook (if any) on both messages.
//! 2. Render both as records and take the union of their target sets; an
//!    empty union selects every field.
//! 3. Restrict each record to the selected fields.
//! 4. Compare entrywise. Nested records (matches, instructions, flow stats
//!    entries) are compared recursively with their own targets; lists are
//!    compared element by element.
//!
//! On mismatch both restricted field maps are returned for diagnostics.

use crate::error::ProtocolError;
use crate::wire::matching::normalize_match;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use types::{
    Body, Message, MessageKind, MultipartReplyBody, MultipartRequestBody, Record, Stringify,
    TargetSet, Value,
};

/// Field name → value, restricted to the effective targets
pub type FieldMap = BTreeMap<String, Value>;

/// Rewrites a message into its canonical form before comparison
pub type NormalizeHook = fn(&Message) -> Result<Message, ProtocolError>;

/// Both sides of a failed comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub name: String,
    pub expected: FieldMap,
    pub actual: FieldMap,
}

fn write_map(f: &mut fmt::Formatter<'_>, map: &FieldMap) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (name, value)) in map.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", name, value)?;
    }
    write!(f, "}}")
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mismatch: expected ", self.name)?;
        write_map(f, &self.expected)?;
        write!(f, " actual ")?;
        write_map(f, &self.actual)
    }
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Normalization of {kind} failed: {source}")]
    Normalize {
        kind: MessageKind,
        #[source]
        source: ProtocolError,
    },

    #[error("{0}")]
    Mismatch(Box<Mismatch>),
}

/// Sub-mapping of `record` selected by `targets` (empty = every field)
pub fn restrict(record: &Record, targets: &TargetSet) -> FieldMap {
    record
        .attrs
        .iter()
        .filter(|(name, _)| targets.is_empty() || targets.contains(name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn maps_equal(expected: &FieldMap, actual: &FieldMap) -> bool {
    expected.len() == actual.len()
        && expected.iter().all(|(name, value)| {
            actual
                .get(name)
                .map_or(false, |other| values_equal(value, other))
        })
}

pub fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Record(a), Value::Record(b)) => records_equal(a, b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => expected == actual,
    }
}

pub fn records_equal(expected: &Record, actual: &Record) -> bool {
    compare_records(expected, actual).is_ok()
}

/// Compare two records under the union of their targets
pub fn compare_records(expected: &Record, actual: &Record) -> Result<(), Box<Mismatch>> {
    let targets = expected.targets.union(&actual.targets);
    let expected_map = restrict(expected, &targets);
    let actual_map = restrict(actual, &targets);
    if expected.name == actual.name && maps_equal(&expected_map, &actual_map) {
        return Ok(());
    }
    Err(Box::new(Mismatch {
        name: if expected.name == actual.name {
            expected.name.to_string()
        } else {
            format!("{} vs {}", expected.name, actual.name)
        },
        expected: expected_map,
        actual: actual_map,
    }))
}

/// Re-encode every match carried by the message so that equivalent layouts compare equal
pub fn normalize_matches(msg: &Message) -> Result<Message, ProtocolError> {
    let mut msg = msg.clone();
    match &mut msg.body {
        Body::FlowMod(flow_mod) => {
            flow_mod.match_ = normalize_match(&flow_mod.match_)?;
        }
        Body::MultipartRequest(request) => {
            if let MultipartRequestBody::Flow(flow) = &mut request.body {
                flow.match_ = normalize_match(&flow.match_)?;
            }
        }
        Body::MultipartReply(reply) => {
            if let MultipartReplyBody::Flow(entries) = &mut reply.body {
                for entry in entries.iter_mut() {
                    entry.match_ = normalize_match(&entry.match_)?;
                }
            }
        }
        _ => {}
    }
    Ok(msg)
}

/// Comparison engine with its per-kind normalization table
#[derive(Debug, Clone)]
pub struct Comparator {
    hooks: HashMap<MessageKind, NormalizeHook>,
}

impl Default for Comparator {
    fn default() -> Self {
        let mut comparator = Self::without_hooks();
        for kind in [
            MessageKind::FlowMod,
            MessageKind::MultipartRequest,
            MessageKind::MultipartReply,
        ] {
            comparator.register_hook(kind, normalize_matches);
        }
        comparator
    }
}

impl Comparator {
    pub fn without_hooks() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    pub fn register_hook(&mut self, kind: MessageKind, hook: NormalizeHook) -> Option<NormalizeHook> {
        self.hooks.insert(kind, hook)
    }

    pub fn normalize(&self, msg: &Message) -> Result<Message, CompareError> {
        match self.hooks.get(&msg.kind()) {
            Some(hook) => hook(msg).map_err(|source| CompareError::Normalize {
                kind: msg.kind(),
                source,
            }),
            None => Ok(msg.clone()),
        }
    }

    pub fn compare(&self, expected: &Message, actual: &Message) -> Result<(), CompareError> {
        let expected = self.normalize(expected)?;
        let actual = self.normalize(actual)?;
        compare_records(&expected.to_record(), &actual.to_record()).map_err(CompareError::Mismatch)
    }

    pub fn equal(&self, expected: &Message, actual: &Message) -> bool {
        self.compare(expected, actual).is_ok()
    }
}

/// `Comparator::default().equal(..)`
pub fn equal(expected: &Message, actual: &Message) -> bool {
    Comparator::default().equal(expected, actual)
}
