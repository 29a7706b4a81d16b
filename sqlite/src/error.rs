//! Error types for store operations.
//!
//! Every failure surfaces as a descriptive error — no error codes, no
//! retries, no silent recovery. Messages embed the offending SQL or table
//! name for diagnosability; reporting is the caller's responsibility.

use rowkit_core::InvalidIdentifier;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage cannot be opened, or a handle was requested
    /// while the database is closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Malformed SQL, or the query engine rejected the statement.
    #[error("query failed: {sql}: {source}")]
    Query {
        /// The statement that was rejected.
        sql: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A `required` single-row query matched zero rows.
    #[error("no row matched: {context}")]
    NotFound {
        /// The statement or filter that matched nothing.
        context: String,
    },

    /// A single-row query unexpectedly matched more than one row.
    #[error("ambiguous result: {context} matched more than one row")]
    Integrity {
        /// The statement or filter that was ambiguous.
        context: String,
    },

    /// A scalar result could not be converted to the requested type.
    #[error("cannot read scalar '{value}' as {target}")]
    Format {
        /// The textual form of the offending value.
        value: String,
        /// The requested target type.
        target: &'static str,
    },

    /// The caller violated a stated precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The storage engine rejected an insert, update, or delete.
    #[error("write failed on {table}: {reason}")]
    Write {
        /// The table the statement targeted.
        table: String,
        /// What the engine reported.
        reason: String,
    },

    /// A table or column name contains invalid characters.
    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    /// Schema creation or upgrade failure in the lifecycle manager.
    #[error("schema error: {0}")]
    Schema(String),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
