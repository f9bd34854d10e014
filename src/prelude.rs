//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::codec::{FromCqlValue, ScanTarget, ToCqlValue, encode_dyn, encode_json};
pub use crate::config::{ClusterConfig, ClusterConfigBuilder};
pub use crate::driver_future::{DriverFuture, FutureState};
pub use crate::error::CqlMiddlewareDbError;
pub use crate::paging::{PageIter, PagingState};
pub use crate::prepared::Prepared;
pub use crate::results::{ColumnSpec, QueryResult, Row};
pub use crate::session::{Cluster, Session};
pub use crate::statement::Statement;
pub use crate::taxonomy::{DriverError, ErrorCode, ErrorSource};
pub use crate::types::{CqlValue, ValueType};
