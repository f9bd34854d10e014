use std::sync::Arc;

use bytes::Bytes;

use crate::statement::Statement;
use crate::types::ValueType;

/// A server-side prepared query.
///
/// Cheap to clone; bind it once per execution with [`Prepared::bind`].
#[derive(Debug, Clone)]
pub struct Prepared {
    query: Arc<str>,
    id: Bytes,
    param_types: Arc<[ValueType]>,
}

impl Prepared {
    /// Called by the engine once the server has accepted the query.
    #[must_use]
    pub fn new(query: impl Into<Arc<str>>, id: impl Into<Bytes>, param_types: Vec<ValueType>) -> Self {
        Self {
            query: query.into(),
            id: id.into(),
            param_types: param_types.into(),
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Opaque server id for this prepared query.
    #[must_use]
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    #[must_use]
    pub fn param_types(&self) -> &[ValueType] {
        &self.param_types
    }

    /// A fresh statement sized to this query's parameters. Binds are checked against the
    /// declared parameter types.
    #[must_use]
    pub fn bind(&self) -> Statement {
        Statement::from_prepared(
            Arc::clone(&self.query),
            self.id.clone(),
            Arc::clone(&self.param_types),
        )
    }
}
