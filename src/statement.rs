use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::codec::{ToCqlValue, encode_dyn};
use crate::engine::ExecuteRequest;
use crate::error::CqlMiddlewareDbError;
use crate::paging::PagingState;
use crate::results::QueryResult;
use crate::types::{CqlValue, ValueType};

/// An executable query with positional parameters and an optional paging cursor.
///
/// Statements are reusable: bind, execute, rebind, execute again. Positions that were never
/// bound are sent as `Null`.
///
/// ```rust
/// use cql_middleware::prelude::*;
///
/// let mut stmt = Statement::new("INSERT INTO t (id, name) VALUES (?, ?)", 2);
/// stmt.bind_all(&[&1_i32, &"alice"])?;
/// assert_eq!(stmt.values(), vec![CqlValue::Int(1), CqlValue::Text("alice".into())]);
/// # Ok::<(), CqlMiddlewareDbError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Statement {
    query: Arc<str>,
    values: Vec<Option<CqlValue>>,
    prepared: Option<PreparedBinding>,
    page_size: Option<u32>,
    paging_state: Option<PagingState>,
}

#[derive(Debug, Clone)]
struct PreparedBinding {
    id: Bytes,
    param_types: Arc<[ValueType]>,
}

impl Statement {
    #[must_use]
    pub fn new(query: impl Into<Arc<str>>, param_count: usize) -> Self {
        Self {
            query: query.into(),
            values: vec![None; param_count],
            prepared: None,
            page_size: None,
            paging_state: None,
        }
    }

    pub(crate) fn from_prepared(query: Arc<str>, id: Bytes, param_types: Arc<[ValueType]>) -> Self {
        Self {
            query,
            values: vec![None; param_types.len()],
            prepared: Some(PreparedBinding { id, param_types }),
            page_size: None,
            paging_state: None,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    /// Bind one positional parameter, replacing any previous value at that position.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for a position past the declared count, and `TypeMismatch`
    /// when the statement came from a prepared query that declares a different type there.
    pub fn bind<V: ToCqlValue + ?Sized>(
        &mut self,
        position: usize,
        value: &V,
    ) -> Result<(), CqlMiddlewareDbError> {
        self.bind_value(position, value.to_cql_value())
    }

    /// Bind an already-tagged value.
    ///
    /// # Errors
    ///
    /// As [`Statement::bind`].
    pub fn bind_value(
        &mut self,
        position: usize,
        value: CqlValue,
    ) -> Result<(), CqlMiddlewareDbError> {
        self.check(position, &value)?;
        trace!(position, kind = value.kind_name(), "bind");
        self.values[position] = Some(value);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for a position past the declared count.
    pub fn bind_null(&mut self, position: usize) -> Result<(), CqlMiddlewareDbError> {
        self.bind_value(position, CqlValue::Null)
    }

    /// Bind a value whose kind is only known at runtime.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` for kinds without a wire representation, otherwise as
    /// [`Statement::bind`].
    pub fn bind_dyn<T: Any>(
        &mut self,
        position: usize,
        value: &T,
    ) -> Result<(), CqlMiddlewareDbError> {
        let encoded = encode_dyn(value)?;
        self.bind_value(position, encoded)
    }

    /// Reset every binding, then bind `values` from position 0 upward.
    ///
    /// Fewer values than parameters is fine; the rest stay unbound (sent as `Null`). Nothing is
    /// changed if any value is rejected.
    ///
    /// # Errors
    ///
    /// Returns `ArgumentCountMismatch` when more values than declared parameters are supplied.
    pub fn bind_all(&mut self, values: &[&dyn ToCqlValue]) -> Result<(), CqlMiddlewareDbError> {
        if values.len() > self.values.len() {
            return Err(CqlMiddlewareDbError::ArgumentCountMismatch {
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        let encoded: Vec<CqlValue> = values.iter().map(|v| v.to_cql_value()).collect();
        for (position, value) in encoded.iter().enumerate() {
            self.check(position, value)?;
        }
        self.clear_bindings();
        for (slot, value) in self.values.iter_mut().zip(encoded) {
            *slot = Some(value);
        }
        trace!(count = values.len(), "bind_all");
        Ok(())
    }

    /// Forget every bound value. The paging state is kept.
    pub fn clear_bindings(&mut self) {
        self.values.iter_mut().for_each(|slot| *slot = None);
    }

    #[must_use]
    pub fn is_bound(&self, position: usize) -> bool {
        self.values.get(position).is_some_and(Option::is_some)
    }

    /// Values as they will be sent, with unbound positions resolved to `Null`.
    #[must_use]
    pub fn values(&self) -> Vec<CqlValue> {
        self.values
            .iter()
            .map(|v| v.clone().unwrap_or(CqlValue::Null))
            .collect()
    }

    /// Ask the server for at most `page_size` rows per result.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = Some(page_size);
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    pub fn set_paging_state(&mut self, state: PagingState) {
        self.paging_state = Some(state);
    }

    /// Resume after `result` on the next execution.
    ///
    /// Returns `false`, and clears any stored token, when `result` was the final page.
    pub fn set_paging_state_from(&mut self, result: &QueryResult) -> bool {
        self.paging_state = result.paging_state().cloned();
        self.paging_state.is_some()
    }

    /// Restart from the first page on the next execution.
    pub fn clear_paging_state(&mut self) {
        self.paging_state = None;
    }

    #[must_use]
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }

    /// Owned snapshot handed to the engine, so later rebinding never touches an in-flight
    /// request.
    pub(crate) fn to_request(&self) -> ExecuteRequest {
        ExecuteRequest {
            query: Arc::clone(&self.query),
            prepared_id: self.prepared.as_ref().map(|p| p.id.clone()),
            values: self.values(),
            page_size: self.page_size,
            paging_state: self.paging_state.clone(),
        }
    }

    fn check(&self, position: usize, value: &CqlValue) -> Result<(), CqlMiddlewareDbError> {
        if position >= self.values.len() {
            return Err(CqlMiddlewareDbError::IndexOutOfBounds {
                index: position,
                len: self.values.len(),
            });
        }
        if let Some(prepared) = &self.prepared {
            let declared = prepared.param_types[position];
            if !value.is_null() && !declared.accepts(value.value_type()) {
                return Err(CqlMiddlewareDbError::type_mismatch(
                    declared.name(),
                    value.kind_name(),
                ));
            }
        }
        Ok(())
    }
}
