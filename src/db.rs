//! SQLite execution against a single long-lived connection.
//!
//! The connection opens once at startup and closes when the handle drops.
//! SQL arrives verbatim from the translator and runs with no sanitization,
//! allow-listing, or read-only enforcement; mutating statements are accepted
//! and executed. The trust boundary sits at the model output (see
//! DESIGN.md), and driver errors are captured as data instead of crashing
//! the process.
//!
//! Only one logical request is ever in flight, so the connection needs no
//! pooling or locking. Statements run exactly once with no retry and no
//! transaction wrapping beyond the driver's default.

use std::path::Path;

use compact_str::CompactString;
use rusqlite::{Connection, types::ValueRef};
use serde::Serialize;

use crate::error::{AppResult, db_open_error};

/// Single cell of a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>)
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Blob(bytes) => write!(f, "<blob {} bytes>", bytes.len())
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec())
        }
    }
}

/// Ordered column names and rows read back from one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns:       Vec<CompactString>,
    pub rows:          Vec<Vec<CellValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<usize>
}

/// Outcome of running one SQL text. Exactly one per request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Statement ran; columns and rows captured in order.
    Success(QueryResult),
    /// The database rejected the statement; driver message kept verbatim.
    Failure(String),
    /// The translator produced no SQL; nothing reached the driver.
    NoQuery
}

/// Handle to the open database file.
pub struct Database {
    conn: Connection
}

impl Database {
    /// Open a file-backed database.
    pub fn open(path: &Path) -> AppResult<Self> {
        let conn =
            Connection::open(path).map_err(|e| db_open_error(&path.display().to_string(), e))?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| db_open_error(":memory:", e))?;
        Ok(Self { conn })
    }

    /// Run one SQL text exactly once, catching driver errors.
    ///
    /// Empty input never reaches the driver; it maps to
    /// [`ExecutionOutcome::NoQuery`].
    pub fn execute(&self, sql: &str) -> ExecutionOutcome {
        let sql = sql.trim();
        if sql.is_empty() {
            return ExecutionOutcome::NoQuery;
        }
        match self.run(sql) {
            Ok(result) => ExecutionOutcome::Success(result),
            Err(e) => ExecutionOutcome::Failure(e.to_string())
        }
    }

    fn run(&self, sql: &str) -> rusqlite::Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            // INSERT/UPDATE/DELETE and friends have no result descriptor
            let affected = stmt.execute([])?;
            return Ok(QueryResult {
                columns:       Vec::new(),
                rows:          Vec::new(),
                rows_affected: Some(affected)
            });
        }
        let columns: Vec<CompactString> = stmt
            .column_names()
            .into_iter()
            .map(CompactString::new)
            .collect();
        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(CellValue::from(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(QueryResult {
            columns,
            rows: out,
            rows_affected: None
        })
    }
}
