use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};
use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CqlMiddlewareDbError;
use crate::types::{CqlValue, ValueType};

/// Destination kinds a tagged value can be decoded into.
///
/// Decoding is strict: a tag that does not match the destination fails with `TypeMismatch`
/// instead of being coerced. Text and blob destinations copy out of the row, so the decoded value
/// outlives the result it came from.
pub trait FromCqlValue: Sized {
    /// Kind name used in mismatch errors.
    const KIND: &'static str;

    /// Whether `Null` decodes into `Self`.
    const NULLABLE: bool = false;

    /// Whether a column of this wire type can be decoded into `Self`.
    fn accepts(column_type: ValueType) -> bool;

    /// Decode one value.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::TypeMismatch` when the value's tag does not fit `Self`,
    /// including `Null` for non-`Option` destinations.
    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError>;
}

fn mismatch<T: FromCqlValue>(value: &CqlValue) -> CqlMiddlewareDbError {
    CqlMiddlewareDbError::type_mismatch(T::KIND, value.kind_name())
}

macro_rules! impl_from_cql_copy {
    ($($ty:ty => $variant:ident, $kind:literal, [$($col:ident),+]);+ $(;)?) => {
        $(
            impl FromCqlValue for $ty {
                const KIND: &'static str = $kind;

                fn accepts(column_type: ValueType) -> bool {
                    matches!(column_type, $(ValueType::$col)|+)
                }

                fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
                    match value {
                        CqlValue::$variant(v) => Ok(*v),
                        other => Err(mismatch::<Self>(other)),
                    }
                }
            }
        )+
    };
}

impl_from_cql_copy! {
    bool => Bool, "boolean", [Boolean];
    i32 => Int, "int", [Int];
    i64 => BigInt, "bigint", [BigInt, Counter];
    f32 => Float, "float", [Float];
    f64 => Double, "double", [Double];
    Uuid => Uuid, "uuid", [Uuid, TimeUuid];
    DateTime<Utc> => Timestamp, "timestamp", [Timestamp];
    IpAddr => Inet, "inet", [Inet];
}

impl FromCqlValue for String {
    const KIND: &'static str = "text";

    fn accepts(column_type: ValueType) -> bool {
        matches!(
            column_type,
            ValueType::Ascii | ValueType::Text | ValueType::Varchar
        )
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Text(s) => Ok(s.clone()),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCqlValue for Vec<u8> {
    const KIND: &'static str = "blob";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Blob
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Blob(bytes) => Ok(bytes.clone()),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl FromCqlValue for Bytes {
    const KIND: &'static str = "blob";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Blob
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Blob(bytes) => Ok(Bytes::copy_from_slice(bytes)),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

/// Passes any cell through untouched, including `Null`.
impl FromCqlValue for CqlValue {
    const KIND: &'static str = "any";
    const NULLABLE: bool = true;

    fn accepts(_column_type: ValueType) -> bool {
        true
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        Ok(value.clone())
    }
}

impl<T: FromCqlValue> FromCqlValue for Option<T> {
    const KIND: &'static str = T::KIND;
    const NULLABLE: bool = true;

    fn accepts(column_type: ValueType) -> bool {
        T::accepts(column_type)
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Null => Ok(None),
            other => T::from_cql_value(other).map(Some),
        }
    }
}

fn collection_elements<'v, C: FromCqlValue>(
    value: &'v CqlValue,
) -> Result<&'v [CqlValue], CqlMiddlewareDbError> {
    value.as_elements().ok_or_else(|| mismatch::<C>(value))
}

impl<T: FromCqlValue> FromCqlValue for Vec<T> {
    const KIND: &'static str = "list";

    fn accepts(column_type: ValueType) -> bool {
        matches!(column_type, ValueType::List | ValueType::Set)
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        collection_elements::<Self>(value)?
            .iter()
            .map(T::from_cql_value)
            .collect()
    }
}

impl<T: FromCqlValue + Ord> FromCqlValue for BTreeSet<T> {
    const KIND: &'static str = "set";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Set
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Set(items) => items.iter().map(T::from_cql_value).collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl<T, S> FromCqlValue for HashSet<T, S>
where
    T: FromCqlValue + Eq + Hash,
    S: BuildHasher + Default,
{
    const KIND: &'static str = "set";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Set
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Set(items) => items.iter().map(T::from_cql_value).collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl<K: FromCqlValue + Ord, V: FromCqlValue> FromCqlValue for BTreeMap<K, V> {
    const KIND: &'static str = "map";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Map
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((K::from_cql_value(k)?, V::from_cql_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

impl<K, V, S> FromCqlValue for HashMap<K, V, S>
where
    K: FromCqlValue + Eq + Hash,
    V: FromCqlValue,
    S: BuildHasher + Default,
{
    const KIND: &'static str = "map";

    fn accepts(column_type: ValueType) -> bool {
        column_type == ValueType::Map
    }

    fn from_cql_value(value: &CqlValue) -> Result<Self, CqlMiddlewareDbError> {
        match value {
            CqlValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((K::from_cql_value(k)?, V::from_cql_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(other)),
        }
    }
}

/// Decode a value without column metadata.
///
/// # Errors
///
/// Returns `CqlMiddlewareDbError::TypeMismatch` if the tag does not match `T`.
pub fn decode<T: FromCqlValue>(value: &CqlValue) -> Result<T, CqlMiddlewareDbError> {
    T::from_cql_value(value)
}

/// Check that a cell can decode into `T` from its column type and nullness alone, without
/// copying anything out.
///
/// # Errors
///
/// Returns `CqlMiddlewareDbError::TypeMismatch` if `T` does not accept the column type, or the
/// cell is `Null` and `T` is not nullable.
pub fn check_column<T: FromCqlValue>(
    column_type: ValueType,
    value: &CqlValue,
) -> Result<(), CqlMiddlewareDbError> {
    if !T::accepts(column_type) {
        return Err(CqlMiddlewareDbError::type_mismatch(
            T::KIND,
            column_type.name(),
        ));
    }
    if value.is_null() && !T::NULLABLE {
        return Err(mismatch::<T>(value));
    }
    Ok(())
}

/// Decode a cell, checking the destination against the column's declared type first.
///
/// # Errors
///
/// Returns `CqlMiddlewareDbError::TypeMismatch` if the column type or the cell's tag does not
/// match `T`.
pub fn decode_column<T: FromCqlValue>(
    column_type: ValueType,
    value: &CqlValue,
) -> Result<T, CqlMiddlewareDbError> {
    check_column::<T>(column_type, value)?;
    T::from_cql_value(value)
}

/// A typed, mutable destination for one column of a scanned row.
///
/// Every [`FromCqlValue`] type is a scan target, so `&mut i32`, `&mut String`,
/// `&mut Option<Vec<u8>>` and so on coerce to `&mut dyn ScanTarget`.
pub trait ScanTarget {
    /// Whether the cell would be accepted, without writing to `self`.
    ///
    /// # Errors
    ///
    /// As [`check_column`].
    fn check(&self, column_type: ValueType, value: &CqlValue) -> Result<(), CqlMiddlewareDbError>;

    /// Overwrite `self` with the decoded cell. On error `self` is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::TypeMismatch` when the destination kind disagrees with
    /// the column.
    fn scan_from(
        &mut self,
        column_type: ValueType,
        value: &CqlValue,
    ) -> Result<(), CqlMiddlewareDbError>;
}

impl<T: FromCqlValue> ScanTarget for T {
    fn check(&self, column_type: ValueType, value: &CqlValue) -> Result<(), CqlMiddlewareDbError> {
        check_column::<T>(column_type, value)
    }

    fn scan_from(
        &mut self,
        column_type: ValueType,
        value: &CqlValue,
    ) -> Result<(), CqlMiddlewareDbError> {
        *self = decode_column::<T>(column_type, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_needs_an_option_destination() {
        assert!(matches!(
            decode::<i32>(&CqlValue::Null),
            Err(CqlMiddlewareDbError::TypeMismatch {
                expected: "int",
                actual: "null"
            })
        ));
        assert_eq!(decode::<Option<i32>>(&CqlValue::Null).unwrap(), None);
    }

    #[test]
    fn counter_column_decodes_as_bigint() {
        let v: i64 = decode_column(ValueType::Counter, &CqlValue::BigInt(9)).unwrap();
        assert_eq!(v, 9);
    }

    #[test]
    fn failed_scan_leaves_destination_untouched() {
        let mut dest = 5_i32;
        let err = dest
            .scan_from(ValueType::Blob, &CqlValue::Blob(vec![1]))
            .unwrap_err();
        assert!(matches!(err, CqlMiddlewareDbError::TypeMismatch { .. }));
        assert_eq!(dest, 5);
    }

    #[test]
    fn check_rejects_null_for_plain_destinations() {
        let plain = 0_i32;
        let optional: Option<i32> = None;
        assert!(plain.check(ValueType::Int, &CqlValue::Null).is_err());
        assert!(optional.check(ValueType::Int, &CqlValue::Null).is_ok());
        assert!(plain.check(ValueType::Int, &CqlValue::Int(1)).is_ok());
    }
}
