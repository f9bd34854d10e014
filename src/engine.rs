//! The seam to the native client engine.
//!
//! Transport, pooling, node discovery, authentication and retry policy all live behind
//! [`Engine`]. The engine receives owned requests plus a [`Completer`] and settles the completer
//! from its own I/O threads; nothing in this crate performs network I/O or spawns workers.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::ClusterConfig;
use crate::driver_future::Completer;
use crate::paging::PagingState;
use crate::prepared::Prepared;
use crate::results::QueryResult;
use crate::types::CqlValue;

/// Owned snapshot of a statement at the moment it was executed.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub query: Arc<str>,
    /// Set when the statement was bound from a prepared query.
    pub prepared_id: Option<Bytes>,
    /// One value per declared parameter; unbound positions are `Null`.
    pub values: Vec<CqlValue>,
    pub page_size: Option<u32>,
    /// Token from the previous page, passed back unmodified.
    pub paging_state: Option<PagingState>,
}

/// A native client engine.
///
/// Every method must eventually settle its completer, either by completing it or by dropping
/// it. A failure is reported with [`Completer::fail_raw`] carrying the engine's packed
/// `(source << 24) | code` value.
pub trait Engine: Send + Sync {
    fn connect(&self, config: &ClusterConfig, completer: Completer<()>);

    fn execute(&self, request: ExecuteRequest, completer: Completer<QueryResult>);

    fn prepare(&self, query: &str, completer: Completer<Prepared>);

    fn close(&self, completer: Completer<()>);
}
