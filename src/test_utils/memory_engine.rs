use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::config::ClusterConfig;
use crate::driver_future::Completer;
use crate::engine::{Engine, ExecuteRequest};
use crate::paging::PagingState;
use crate::prepared::Prepared;
use crate::results::{ColumnSpec, QueryResult};
use crate::taxonomy::{ErrorCode, LibraryError, ServerError};
use crate::types::{CqlValue, ValueType};

const TOKEN_MAGIC: &[u8; 4] = b"mem1";

struct Fixture {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<CqlValue>>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Fixture>,
    prepared: HashMap<String, Vec<ValueType>>,
    failures: HashMap<String, (u32, String)>,
    connect_failure: Option<(u32, String)>,
    requests: Vec<ExecuteRequest>,
}

/// An in-process engine serving fixture rows, for tests and benches.
///
/// Results are looked up by exact query text. Queries with no fixture succeed with an empty
/// result (as a write would). Paging slices fixture rows by the request's page size and hands
/// out tokens only this engine understands.
#[derive(Default)]
pub struct MemoryEngine {
    inner: Mutex<Inner>,
    executions: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete every operation from a separate thread after `latency`, like a real I/O thread.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `rows` for `query`.
    pub fn add_table(&self, query: &str, columns: Vec<ColumnSpec>, rows: Vec<Vec<CqlValue>>) {
        self.lock()
            .tables
            .insert(query.to_string(), Fixture { columns, rows });
    }

    /// Accept `prepare(query)` with these parameter types.
    pub fn declare_prepared(&self, query: &str, param_types: Vec<ValueType>) {
        self.lock().prepared.insert(query.to_string(), param_types);
    }

    /// Fail every execute or prepare of `query` with a raw packed code.
    pub fn fail_query(&self, query: &str, raw_code: u32, message: &str) {
        self.lock()
            .failures
            .insert(query.to_string(), (raw_code, message.to_string()));
    }

    pub fn fail_connect(&self, raw_code: u32, message: &str) {
        self.lock().connect_failure = Some((raw_code, message.to_string()));
    }

    /// Number of execute calls received.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    /// Every execute request received, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<ExecuteRequest> {
        self.lock().requests.clone()
    }

    fn deliver<T: Send + 'static>(&self, completer: Completer<T>, outcome: Outcome<T>) {
        let settle = move || match outcome {
            Outcome::Ok(payload) => completer.succeed(payload),
            Outcome::Raw(code, message) => completer.fail_raw(code, message),
        };
        match self.latency {
            Some(latency) => {
                thread::spawn(move || {
                    thread::sleep(latency);
                    settle();
                });
            }
            None => settle(),
        }
    }

    fn page(&self, request: &ExecuteRequest) -> Outcome<QueryResult> {
        let inner = self.lock();
        if let Some((code, message)) = inner.failures.get(request.query.as_ref()) {
            return Outcome::Raw(*code, message.clone());
        }
        let Some(fixture) = inner.tables.get(request.query.as_ref()) else {
            return Outcome::Ok(QueryResult::empty());
        };

        let offset = match request.paging_state.as_ref().map(decode_token) {
            None => 0,
            Some(Some(offset)) => offset,
            Some(None) => {
                return Outcome::Raw(
                    ErrorCode::Server(ServerError::ProtocolError).to_raw(),
                    "invalid paging state".to_string(),
                );
            }
        };
        let total = fixture.rows.len();
        let start = offset.min(total);
        let end = match request.page_size {
            Some(size) if size > 0 => start.saturating_add(size as usize).min(total),
            _ => total,
        };
        let token = (end < total).then(|| encode_token(end));
        match QueryResult::new(
            fixture.columns.clone(),
            fixture.rows[start..end].to_vec(),
            token,
        ) {
            Ok(page) => Outcome::Ok(page),
            Err(err) => Outcome::Raw(
                ErrorCode::Library(LibraryError::InvalidValueType).to_raw(),
                err.to_string(),
            ),
        }
    }
}

enum Outcome<T> {
    Ok(T),
    Raw(u32, String),
}

fn encode_token(offset: usize) -> PagingState {
    let mut buf = BytesMut::with_capacity(12);
    buf.put_slice(TOKEN_MAGIC);
    buf.put_u64(offset as u64);
    PagingState::from_bytes(buf.freeze())
}

fn decode_token(state: &PagingState) -> Option<usize> {
    let bytes = state.as_bytes();
    let (magic, offset) = bytes.split_at_checked(TOKEN_MAGIC.len())?;
    if magic != TOKEN_MAGIC {
        return None;
    }
    let offset: [u8; 8] = offset.try_into().ok()?;
    usize::try_from(u64::from_be_bytes(offset)).ok()
}

impl Engine for MemoryEngine {
    fn connect(&self, config: &ClusterConfig, completer: Completer<()>) {
        debug!(contact_points = ?config.contact_points, "memory engine connect");
        let failure = self.lock().connect_failure.clone();
        let outcome = match failure {
            Some((code, message)) => Outcome::Raw(code, message),
            None => Outcome::Ok(()),
        };
        self.deliver(completer, outcome);
    }

    fn execute(&self, request: ExecuteRequest, completer: Completer<QueryResult>) {
        self.executions.fetch_add(1, Ordering::SeqCst);
        let outcome = self.page(&request);
        self.lock().requests.push(request);
        self.deliver(completer, outcome);
    }

    fn prepare(&self, query: &str, completer: Completer<Prepared>) {
        let outcome = {
            let inner = self.lock();
            if let Some((code, message)) = inner.failures.get(query) {
                Outcome::Raw(*code, message.clone())
            } else if let Some(types) = inner.prepared.get(query) {
                let id = Bytes::copy_from_slice(&(query.len() as u64).to_be_bytes());
                Outcome::Ok(Prepared::new(query, id, types.clone()))
            } else {
                Outcome::Raw(
                    ErrorCode::Server(ServerError::InvalidQuery).to_raw(),
                    format!("unknown query: {query}"),
                )
            }
        };
        self.deliver(completer, outcome);
    }

    fn close(&self, completer: Completer<()>) {
        self.deliver(completer, Outcome::Ok(()));
    }
}
