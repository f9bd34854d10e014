use thiserror::Error;

use crate::taxonomy::DriverError;

#[derive(Debug, Error)]
pub enum CqlMiddlewareDbError {
    #[error("Argument count mismatch: expected {expected}, got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },

    #[error("Unsupported application type: {0}")]
    UnsupportedType(String),

    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("No current row: call next() and check it returned true before scanning")]
    NoCurrentRow,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl CqlMiddlewareDbError {
    pub(crate) fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        CqlMiddlewareDbError::TypeMismatch { expected, actual }
    }

    /// The driver error carried by a failed future, if this is one.
    #[must_use]
    pub fn as_driver_error(&self) -> Option<&DriverError> {
        if let CqlMiddlewareDbError::Driver(err) = self {
            Some(err)
        } else {
            None
        }
    }
}
