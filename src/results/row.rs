use crate::codec::{FromCqlValue, ScanTarget, decode_column};
use crate::error::CqlMiddlewareDbError;
use crate::results::result_set::Columns;
use crate::types::{CqlValue, ValueType};

/// A borrowed view of one row. Valid only while its parent result is alive.
#[derive(Debug, Clone, Copy)]
pub struct Row<'r> {
    columns: &'r Columns,
    values: &'r [CqlValue],
}

impl<'r> Row<'r> {
    pub(crate) fn new(columns: &'r Columns, values: &'r [CqlValue]) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow a raw cell. Copy it out (`clone`) to keep it past the row.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&'r CqlValue> {
        self.values.get(index)
    }

    fn column_type(&self, index: usize) -> Result<ValueType, CqlMiddlewareDbError> {
        self.columns
            .specs
            .get(index)
            .map(|c| c.value_type)
            .ok_or(CqlMiddlewareDbError::IndexOutOfBounds {
                index,
                len: self.values.len(),
            })
    }

    /// Decode one column.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for a bad index and `TypeMismatch` if `T` does not fit the
    /// column.
    pub fn get<T: FromCqlValue>(&self, index: usize) -> Result<T, CqlMiddlewareDbError> {
        let column_type = self.column_type(index)?;
        decode_column(column_type, &self.values[index])
    }

    /// Decode one column by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if no column has that name, otherwise as [`Row::get`].
    pub fn get_by_name<T: FromCqlValue>(&self, name: &str) -> Result<T, CqlMiddlewareDbError> {
        let index = self
            .columns
            .position(name)
            .ok_or_else(|| CqlMiddlewareDbError::UnknownColumn(name.to_string()))?;
        self.get(index)
    }

    /// Decode every column into `destinations`, in order.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentCountMismatch` when the destination count differs from the column count
    /// and `TypeMismatch` from the first column that does not fit its destination. Both are
    /// checked for every column before anything is written. The one failure that can still
    /// leave earlier destinations overwritten is a collection whose elements do not decode.
    pub fn scan(&self, destinations: &mut [&mut dyn ScanTarget]) -> Result<(), CqlMiddlewareDbError> {
        if destinations.len() != self.values.len() {
            return Err(CqlMiddlewareDbError::ArgumentCountMismatch {
                expected: self.values.len(),
                actual: destinations.len(),
            });
        }
        for (index, destination) in destinations.iter().enumerate() {
            destination.check(self.column_type(index)?, &self.values[index])?;
        }
        for (index, destination) in destinations.iter_mut().enumerate() {
            let column_type = self.column_type(index)?;
            destination.scan_from(column_type, &self.values[index])?;
        }
        Ok(())
    }
}
