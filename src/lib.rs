//! Client-side driver surface for a wide-column database.
//!
//! The crate sits on top of a native client [`Engine`] and provides typed parameter binding,
//! single-assignment futures with blocking, timed and async waits, row decoding, and
//! paging-state round-tripping:
//!
//! ```rust
//! use std::sync::Arc;
//! use cql_middleware::prelude::*;
//! use cql_middleware::test_utils::MemoryEngine;
//!
//! let engine = Arc::new(MemoryEngine::new());
//! engine.add_table(
//!     "SELECT id FROM t",
//!     vec![ColumnSpec::new("id", ValueType::Int)],
//!     (1..=5).map(|i| vec![CqlValue::Int(i)]).collect(),
//! );
//!
//! let config = ClusterConfig::builder().contact_points("127.0.0.1").build()?;
//! let session = Cluster::new(config, engine).connect().session()?;
//!
//! let mut stmt = Statement::new("SELECT id FROM t", 0);
//! stmt.set_page_size(2);
//! let ids: Vec<i32> = session.pages(&mut stmt).rows_collect()?;
//! assert_eq!(ids, vec![1, 2, 3, 4, 5]);
//! # Ok::<(), CqlMiddlewareDbError>(())
//! ```

pub mod codec;
pub mod config;
pub mod driver_future;
pub mod engine;
pub mod error;
pub mod paging;
pub mod prelude;
pub mod prepared;
pub mod results;
pub mod session;
pub mod statement;
pub mod taxonomy;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use codec::{FromCqlValue, ScanTarget, ToCqlValue, decode, encode_dyn, encode_json};
pub use config::{ClusterConfig, ClusterConfigBuilder};
pub use driver_future::{Completer, DriverFuture, FutureState};
pub use engine::{Engine, ExecuteRequest};
pub use error::CqlMiddlewareDbError;
pub use paging::{PageIter, PagingState};
pub use prepared::Prepared;
pub use results::{ColumnSpec, QueryResult, Row};
pub use session::{Cluster, Session};
pub use statement::Statement;
pub use taxonomy::{DriverError, ErrorCode, ErrorSource, LibraryError, ServerError, TlsError};
pub use types::{CqlValue, ValueType};
