pub mod result_set;
pub mod row;

pub use result_set::{ColumnSpec, QueryResult};
pub use row::Row;
