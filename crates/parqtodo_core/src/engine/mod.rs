//! Embedded query engine.
//!
//! # Responsibility
//! - Host one in-memory SQLite database per process behind a job-based runtime.
//! - Provide connect/send/query plus file-buffer import/export over an
//!   engine-owned virtual filesystem.
//! - Convert tables to and from Parquet buffers.
//!
//! # Invariants
//! - Only the runtime touches the underlying `rusqlite::Connection`.
//! - Jobs run strictly one at a time in submission order.
//! - Virtual files live only as long as the `Database` that owns them.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod bundle;
pub mod columnar;
mod connection;
mod instance;
mod runtime;
mod vfs;

pub use bundle::{select_bundle, EngineBundle, HostCapabilities};
pub use columnar::{ColumnKind, ColumnSpec};
pub use connection::{Database, EngineConnection, ExportStats};
pub use rusqlite::types::Value as SqlValue;

pub type EngineResult<T> = Result<T, EngineError>;

/// Error raised by engine instantiation, statements or file transfer.
#[derive(Debug)]
pub enum EngineError {
    /// The runtime could not be started.
    Instantiate(String),
    /// The worker thread is no longer accepting jobs.
    WorkerGone,
    Sql(rusqlite::Error),
    /// Parquet/Arrow encoding or decoding failed.
    Columnar(String),
    FileNotFound(String),
    TableNotFound(String),
    UnsupportedColumnType { column: String, declared: String },
    TypeMismatch { column: String, expected: ColumnKind },
    /// A read-only query was given a statement that writes.
    ReadOnlyViolation,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instantiate(message) => write!(f, "engine instantiation failed: {message}"),
            Self::WorkerGone => write!(f, "engine worker is not running"),
            Self::Sql(err) => write!(f, "{err}"),
            Self::Columnar(message) => write!(f, "columnar codec error: {message}"),
            Self::FileNotFound(name) => write!(f, "virtual file not found: {name}"),
            Self::TableNotFound(name) => write!(f, "table not found: {name}"),
            Self::UnsupportedColumnType { column, declared } => write!(
                f,
                "column `{column}` has unsupported type `{declared}`"
            ),
            Self::TypeMismatch { column, expected } => write!(
                f,
                "column `{column}` holds a value that is not {}",
                expected.as_str()
            ),
            Self::ReadOnlyViolation => write!(f, "only read-only statements are allowed"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<parquet::errors::ParquetError> for EngineError {
    fn from(value: parquet::errors::ParquetError) -> Self {
        Self::Columnar(value.to_string())
    }
}

impl From<arrow_schema::ArrowError> for EngineError {
    fn from(value: arrow_schema::ArrowError) -> Self {
        Self::Columnar(value.to_string())
    }
}

impl EngineError {
    /// Returns whether the error is a SQLite constraint violation
    /// (primary key, unique, not null).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sql(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// Column names and row values returned by a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in `columns`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

/// Quotes an identifier for interpolation into statement text.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::quote_ident;

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("todos"), "\"todos\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
