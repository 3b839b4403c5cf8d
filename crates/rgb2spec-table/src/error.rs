//! Table error types.

use thiserror::Error;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while building, reading, or writing a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Table resolution outside the supported range.
    #[error("invalid table size: {0}")]
    InvalidSize(String),

    /// Buffer length does not match the declared resolution.
    #[error("table data size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch {
        /// Expected byte length for the resolution
        expected: usize,
        /// Actual byte length
        got: usize,
    },

    /// I/O error. A failed write aborts the current gamut; the target path
    /// is only updated by a completed rename.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
