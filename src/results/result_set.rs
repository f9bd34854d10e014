use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::ScanTarget;
use crate::error::CqlMiddlewareDbError;
use crate::paging::PagingState;
use crate::results::row::Row;
use crate::types::{CqlValue, ValueType};

/// Name and wire type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub value_type: ValueType,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Column metadata shared by every row of a result.
#[derive(Debug)]
pub(crate) struct Columns {
    pub(crate) specs: Vec<ColumnSpec>,
    // Name lookups without repeated string scans.
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(specs: Vec<ColumnSpec>) -> Self {
        let index = specs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { specs, index }
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

/// One page of rows returned by an execute, with a forward-only cursor.
///
/// The cursor is advanced with [`QueryResult::next`] and read with [`QueryResult::row`] or
/// [`QueryResult::scan`]. Advancing takes `&mut self`, so a result has a single consumer at a
/// time. [`QueryResult::rows`] iterates independently of the cursor.
#[derive(Debug)]
pub struct QueryResult {
    columns: Arc<Columns>,
    rows: Vec<Vec<CqlValue>>,
    paging_state: Option<PagingState>,
    // Index of the current row; None before the first next().
    cursor: Option<usize>,
}

impl QueryResult {
    /// Build a result from the engine's row buffer.
    ///
    /// `paging_state` is `Some` when the server truncated the result.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentCountMismatch` if a row's width differs from the column count and
    /// `TypeMismatch` if a non-null cell's tag does not fit its column.
    pub fn new(
        columns: Vec<ColumnSpec>,
        rows: Vec<Vec<CqlValue>>,
        paging_state: Option<PagingState>,
    ) -> Result<Self, CqlMiddlewareDbError> {
        for row in &rows {
            if row.len() != columns.len() {
                return Err(CqlMiddlewareDbError::ArgumentCountMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            for (cell, column) in row.iter().zip(&columns) {
                if !cell.is_null() && !column.value_type.accepts(cell.value_type()) {
                    return Err(CqlMiddlewareDbError::type_mismatch(
                        column.value_type.name(),
                        cell.kind_name(),
                    ));
                }
            }
        }
        Ok(Self {
            columns: Arc::new(Columns::new(columns)),
            rows,
            paging_state,
            cursor: None,
        })
    }

    /// A result with no columns and no rows, as returned by writes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Arc::new(Columns::new(Vec::new())),
            rows: Vec::new(),
            paging_state: None,
            cursor: None,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.specs.len()
    }

    #[must_use]
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.specs.get(index).map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn column_type(&self, index: usize) -> Option<ValueType> {
        self.columns.specs.get(index).map(|c| c.value_type)
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.position(name)
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns.specs
    }

    /// Advance the cursor. Returns `false` once every row has been visited; that is the only
    /// end-of-rows signal.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i.saturating_add(1));
        if next < self.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            // Park past the end so later calls keep returning false.
            self.cursor = Some(self.rows.len());
            false
        }
    }

    /// The row under the cursor, if `next()` last returned `true`.
    #[must_use]
    pub fn row(&self) -> Option<Row<'_>> {
        let index = self.cursor?;
        self.rows
            .get(index)
            .map(|values| Row::new(&self.columns, values))
    }

    /// Decode the current row into `destinations`, in column order.
    ///
    /// Precondition: the last call to [`QueryResult::next`] returned `true`.
    ///
    /// # Errors
    ///
    /// - `NoCurrentRow` if the precondition does not hold
    /// - `ArgumentCountMismatch` if `destinations.len() != column_count()`
    /// - `TypeMismatch` if a destination disagrees with its column's type
    pub fn scan(
        &self,
        destinations: &mut [&mut dyn ScanTarget],
    ) -> Result<(), CqlMiddlewareDbError> {
        self.row()
            .ok_or(CqlMiddlewareDbError::NoCurrentRow)?
            .scan(destinations)
    }

    /// Whether the server truncated this result.
    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.paging_state.is_some()
    }

    /// Continuation token for the next page; `None` on the final page.
    #[must_use]
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }

    /// Iterate all rows without touching the cursor.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows
            .iter()
            .map(move |values| Row::new(&self.columns, values))
    }
}
