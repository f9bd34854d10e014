use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Wire-type tags as reported in result column metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Custom,
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Text,
    Timestamp,
    Uuid,
    Varchar,
    Varint,
    TimeUuid,
    Inet,
    List,
    Map,
    Set,
    Unknown,
}

impl ValueType {
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            ValueType::Custom => 0x0000,
            ValueType::Ascii => 0x0001,
            ValueType::BigInt => 0x0002,
            ValueType::Blob => 0x0003,
            ValueType::Boolean => 0x0004,
            ValueType::Counter => 0x0005,
            ValueType::Decimal => 0x0006,
            ValueType::Double => 0x0007,
            ValueType::Float => 0x0008,
            ValueType::Int => 0x0009,
            ValueType::Text => 0x000A,
            ValueType::Timestamp => 0x000B,
            ValueType::Uuid => 0x000C,
            ValueType::Varchar => 0x000D,
            ValueType::Varint => 0x000E,
            ValueType::TimeUuid => 0x000F,
            ValueType::Inet => 0x0010,
            ValueType::List => 0x0020,
            ValueType::Map => 0x0021,
            ValueType::Set => 0x0022,
            ValueType::Unknown => 0xFFFF,
        }
    }

    /// Tag for a numeric code; codes the engine may add later come back as `Unknown`.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0000 => ValueType::Custom,
            0x0001 => ValueType::Ascii,
            0x0002 => ValueType::BigInt,
            0x0003 => ValueType::Blob,
            0x0004 => ValueType::Boolean,
            0x0005 => ValueType::Counter,
            0x0006 => ValueType::Decimal,
            0x0007 => ValueType::Double,
            0x0008 => ValueType::Float,
            0x0009 => ValueType::Int,
            0x000A => ValueType::Text,
            0x000B => ValueType::Timestamp,
            0x000C => ValueType::Uuid,
            0x000D => ValueType::Varchar,
            0x000E => ValueType::Varint,
            0x000F => ValueType::TimeUuid,
            0x0010 => ValueType::Inet,
            0x0020 => ValueType::List,
            0x0021 => ValueType::Map,
            0x0022 => ValueType::Set,
            _ => ValueType::Unknown,
        }
    }

    /// Whether a value carrying tag `other` may be stored in a column of this type.
    #[must_use]
    pub fn accepts(self, other: ValueType) -> bool {
        if self == other {
            return true;
        }
        matches!(
            (self, other),
            (
                ValueType::Ascii | ValueType::Text | ValueType::Varchar,
                ValueType::Ascii | ValueType::Text | ValueType::Varchar
            ) | (ValueType::BigInt | ValueType::Counter, ValueType::BigInt)
                | (ValueType::Uuid | ValueType::TimeUuid, ValueType::Uuid)
        )
    }
}

impl ValueType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Custom => "custom",
            ValueType::Ascii => "ascii",
            ValueType::BigInt => "bigint",
            ValueType::Blob => "blob",
            ValueType::Boolean => "boolean",
            ValueType::Counter => "counter",
            ValueType::Decimal => "decimal",
            ValueType::Double => "double",
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Text => "text",
            ValueType::Timestamp => "timestamp",
            ValueType::Uuid => "uuid",
            ValueType::Varchar => "varchar",
            ValueType::Varint => "varint",
            ValueType::TimeUuid => "timeuuid",
            ValueType::Inet => "inet",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Set => "set",
            ValueType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value tagged with its wire type, used both for bound parameters and for row cells.
///
/// Empty `Blob`, `Text` and collection values are distinct from `Null`:
/// ```rust
/// use cql_middleware::prelude::*;
///
/// assert!(!CqlValue::Blob(Vec::new()).is_null());
/// assert!(!CqlValue::List(Vec::new()).is_null());
/// assert!(CqlValue::Null.is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// NULL value
    Null,
    Bool(bool),
    /// 32-bit `int`
    Int(i32),
    /// 64-bit `bigint`
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Opaque bytes
    Blob(Vec<u8>),
    /// UTF-8 text
    Text(String),
    Uuid(Uuid),
    /// Millisecond-precision timestamp
    Timestamp(DateTime<Utc>),
    Inet(IpAddr),
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
}

impl CqlValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The tag this value carries on the wire. `Null` is untyped and reports `Unknown`.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            CqlValue::Null => ValueType::Unknown,
            CqlValue::Bool(_) => ValueType::Boolean,
            CqlValue::Int(_) => ValueType::Int,
            CqlValue::BigInt(_) => ValueType::BigInt,
            CqlValue::Float(_) => ValueType::Float,
            CqlValue::Double(_) => ValueType::Double,
            CqlValue::Blob(_) => ValueType::Blob,
            CqlValue::Text(_) => ValueType::Text,
            CqlValue::Uuid(_) => ValueType::Uuid,
            CqlValue::Timestamp(_) => ValueType::Timestamp,
            CqlValue::Inet(_) => ValueType::Inet,
            CqlValue::List(_) => ValueType::List,
            CqlValue::Set(_) => ValueType::Set,
            CqlValue::Map(_) => ValueType::Map,
        }
    }

    /// Short name of the active variant, for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Bool(_) => "boolean",
            CqlValue::Int(_) => "int",
            CqlValue::BigInt(_) => "bigint",
            CqlValue::Float(_) => "float",
            CqlValue::Double(_) => "double",
            CqlValue::Blob(_) => "blob",
            CqlValue::Text(_) => "text",
            CqlValue::Uuid(_) => "uuid",
            CqlValue::Timestamp(_) => "timestamp",
            CqlValue::Inet(_) => "inet",
            CqlValue::List(_) => "list",
            CqlValue::Set(_) => "set",
            CqlValue::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let CqlValue::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        if let CqlValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bigint(&self) -> Option<i64> {
        if let CqlValue::BigInt(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        if let CqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        if let CqlValue::Double(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let CqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let CqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        if let CqlValue::Uuid(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        if let CqlValue::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_inet(&self) -> Option<IpAddr> {
        if let CqlValue::Inet(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Elements of a list or set.
    #[must_use]
    pub fn as_elements(&self) -> Option<&[CqlValue]> {
        match self {
            CqlValue::List(items) | CqlValue::Set(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_entries(&self) -> Option<&[(CqlValue, CqlValue)]> {
        if let CqlValue::Map(entries) = self {
            Some(entries)
        } else {
            None
        }
    }
}
