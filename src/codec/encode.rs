use std::any::{Any, type_name};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::CqlMiddlewareDbError;
use crate::types::CqlValue;

/// Application values that have a wire representation.
///
/// The set of implementors is closed: a type without an impl is rejected at compile time rather
/// than falling through to a runtime default.
pub trait ToCqlValue {
    fn to_cql_value(&self) -> CqlValue;
}

impl<T: ToCqlValue + ?Sized> ToCqlValue for &T {
    fn to_cql_value(&self) -> CqlValue {
        (**self).to_cql_value()
    }
}

impl ToCqlValue for CqlValue {
    fn to_cql_value(&self) -> CqlValue {
        self.clone()
    }
}

macro_rules! impl_to_cql_copy {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl ToCqlValue for $ty {
                fn to_cql_value(&self) -> CqlValue {
                    CqlValue::$variant(*self)
                }
            }
        )+
    };
}

impl_to_cql_copy! {
    bool => Bool,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    IpAddr => Inet,
}

impl ToCqlValue for str {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Text(self.to_owned())
    }
}

impl ToCqlValue for String {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Text(self.clone())
    }
}

impl ToCqlValue for [u8] {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Blob(self.to_vec())
    }
}

impl ToCqlValue for Vec<u8> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Blob(self.clone())
    }
}

impl ToCqlValue for Bytes {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Blob(self.to_vec())
    }
}

impl<T: ToCqlValue> ToCqlValue for Option<T> {
    fn to_cql_value(&self) -> CqlValue {
        match self {
            Some(value) => value.to_cql_value(),
            None => CqlValue::Null,
        }
    }
}

impl<T: ToCqlValue> ToCqlValue for Vec<T> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::List(self.iter().map(ToCqlValue::to_cql_value).collect())
    }
}

impl<T: ToCqlValue> ToCqlValue for BTreeSet<T> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Set(self.iter().map(ToCqlValue::to_cql_value).collect())
    }
}

impl<T: ToCqlValue, S> ToCqlValue for HashSet<T, S> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Set(self.iter().map(ToCqlValue::to_cql_value).collect())
    }
}

impl<K: ToCqlValue, V: ToCqlValue> ToCqlValue for BTreeMap<K, V> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Map(
            self.iter()
                .map(|(k, v)| (k.to_cql_value(), v.to_cql_value()))
                .collect(),
        )
    }
}

impl<K: ToCqlValue, V: ToCqlValue, S> ToCqlValue for HashMap<K, V, S> {
    fn to_cql_value(&self) -> CqlValue {
        CqlValue::Map(
            self.iter()
                .map(|(k, v)| (k.to_cql_value(), v.to_cql_value()))
                .collect(),
        )
    }
}

/// Encode a value whose concrete type is only known at runtime.
///
/// Dispatch is on the runtime kind of `value`. Kinds outside the supported set fail with
/// `UnsupportedType`; the error is local and should not be retried.
///
/// # Errors
///
/// Returns `CqlMiddlewareDbError::UnsupportedType` naming the rejected type.
pub fn encode_dyn<T: Any>(value: &T) -> Result<CqlValue, CqlMiddlewareDbError> {
    let any: &dyn Any = value;

    macro_rules! try_kinds {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(v) = any.downcast_ref::<$ty>() {
                    return Ok(v.to_cql_value());
                }
                if let Some(v) = any.downcast_ref::<Option<$ty>>() {
                    return Ok(v.to_cql_value());
                }
            )+
        };
    }

    if any.is::<()>() {
        return Ok(CqlValue::Null);
    }
    try_kinds!(
        CqlValue,
        bool,
        i32,
        i64,
        f32,
        f64,
        String,
        &'static str,
        Vec<u8>,
        Bytes,
        Uuid,
        DateTime<Utc>,
        IpAddr,
    );
    if let Some(json) = any.downcast_ref::<JsonValue>() {
        return encode_json(json);
    }

    Err(CqlMiddlewareDbError::UnsupportedType(
        type_name::<T>().to_string(),
    ))
}

/// Map a JSON document onto tagged values.
///
/// Objects become text-keyed maps. Numbers that fit neither `i64` nor `f64` are rejected.
///
/// # Errors
///
/// Returns `CqlMiddlewareDbError::UnsupportedType` for unrepresentable numbers.
pub fn encode_json(value: &JsonValue) -> Result<CqlValue, CqlMiddlewareDbError> {
    Ok(match value {
        JsonValue::Null => CqlValue::Null,
        JsonValue::Bool(b) => CqlValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CqlValue::BigInt(i)
            } else if let Some(f) = n.as_f64().filter(|_| n.is_f64()) {
                CqlValue::Double(f)
            } else {
                return Err(CqlMiddlewareDbError::UnsupportedType(format!(
                    "json number {n}"
                )));
            }
        }
        JsonValue::String(s) => CqlValue::Text(s.clone()),
        JsonValue::Array(items) => CqlValue::List(
            items
                .iter()
                .map(encode_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        JsonValue::Object(fields) => CqlValue::Map(
            fields
                .iter()
                .map(|(k, v)| Ok((CqlValue::Text(k.clone()), encode_json(v)?)))
                .collect::<Result<Vec<_>, CqlMiddlewareDbError>>()?,
        ),
    })
}
