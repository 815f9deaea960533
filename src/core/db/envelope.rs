/// Result Envelope Module
///
/// Uniform wrapper for the outcome of a dispatched statement: a status code,
/// a message, the affected-row count and, for queries, the returned rows.
use super::statement::{StatementKind, COD_ERROR};
use rusqlite::types::ValueRef;
use serde::Serialize;
use std::fmt;

/// A single value read from a result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Numeric cells are right-aligned by the table printer.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Real(_))
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

/// Rows returned by a query, fully read from the driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        RowSet { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a cell by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// Outcome of one dispatched statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    /// Status code: 10/20/30/40 per statement kind, -1 when not dispatched
    pub code: i32,
    pub kind: StatementKind,
    pub message: String,
    /// Rows changed by INSERT/UPDATE/DELETE, 0 for SELECT, -1 on error
    pub affected_rows: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<RowSet>,
}

impl ResultEnvelope {
    /// Envelope for a SELECT that ran.
    pub fn selected(rows: RowSet) -> Self {
        ResultEnvelope {
            code: StatementKind::Select.code(),
            kind: StatementKind::Select,
            message: StatementKind::Select.success_message().to_string(),
            affected_rows: 0,
            rows: Some(rows),
        }
    }

    /// Envelope for an INSERT, UPDATE or DELETE that ran.
    pub fn updated(kind: StatementKind, affected_rows: i64) -> Self {
        if !kind.is_update() {
            return ResultEnvelope::error();
        }
        ResultEnvelope {
            code: kind.code(),
            kind,
            message: kind.success_message().to_string(),
            affected_rows,
            rows: None,
        }
    }

    /// Envelope for a statement the dispatcher does not run.
    pub fn error() -> Self {
        ResultEnvelope {
            code: COD_ERROR,
            kind: StatementKind::Unknown,
            message: StatementKind::Unknown.success_message().to_string(),
            affected_rows: -1,
            rows: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.code == COD_ERROR
    }

    pub fn rows(&self) -> Option<&RowSet> {
        self.rows.as_ref()
    }
}
