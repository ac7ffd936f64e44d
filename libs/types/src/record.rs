//! Comparable field records
//!
//! Every message body and nested structure can render itself as a `Record`:
//! an ordered list of `(field name, Value)` pairs plus the `TargetSet`
//! attached to that value. The comparison engine in `ofp-codec` works purely
//! on records, so it never needs to know the layout of a particular kind.

use crate::targets::TargetSet;
use std::borrow::Cow;
use std::fmt;

/// Field value inside a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(u64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Record(Record),
    /// Field not set (e.g. an expectation that leaves the xid open)
    Absent,
}

impl Value {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// List of nested records
    pub fn records<'a, T, I>(items: I) -> Self
    where
        T: Stringify + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        Value::List(items.into_iter().map(|item| Value::Record(item.to_record())).collect())
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Absent)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{:?}", v),
            Value::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(record) => write!(f, "{}", record),
            Value::Absent => write!(f, "None"),
        }
    }
}

/// Named, ordered field mapping of one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Cow<'static, str>,
    pub attrs: Vec<(Cow<'static, str>, Value)>,
    pub targets: TargetSet,
}

impl Record {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            targets: TargetSet::new(),
        }
    }

    /// Append a field (builder style)
    pub fn attr(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) {
        self.attrs.push((name.into(), value.into()));
    }

    pub fn with_targets(mut self, targets: TargetSet) -> Self {
        self.targets = targets;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr.as_ref() == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Render a value as its comparable record
pub trait Stringify {
    fn to_record(&self) -> Record;
}
