/// Statement Classification Module
///
/// Classifies SQL text by its leading keyword and maps each class to the
/// numeric status code reported in a result envelope.
use serde::Serialize;
use std::fmt;

/// Status code of a SELECT statement
pub const COD_SELECT: i32 = 10;
/// Status code of an INSERT statement
pub const COD_INSERT: i32 = 20;
/// Status code of an UPDATE statement
pub const COD_UPDATE: i32 = 30;
/// Status code of a DELETE statement
pub const COD_DELETE: i32 = 40;
/// Status code of a statement that could not be dispatched
pub const COD_ERROR: i32 = -1;

/// The statement classes the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    /// SELECT statement, executed as a query
    Select,
    /// INSERT statement, executed as an update
    Insert,
    /// UPDATE statement, executed as an update
    Update,
    /// DELETE statement, executed as an update
    Delete,
    /// Anything else (DDL, PRAGMA, WITH, empty input)
    Unknown,
}

impl StatementKind {
    /// Determines the statement kind from a SQL string.
    ///
    /// The first word after any leading whitespace is compared against the
    /// known keywords, ignoring case. `SELECTED` or `INSERTS` are not keywords
    /// and classify as `Unknown`.
    pub fn from_sql(sql: &str) -> Self {
        let keyword: String = sql
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();

        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => StatementKind::Select,
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Unknown,
        }
    }

    /// Status code reported in the result envelope.
    pub fn code(self) -> i32 {
        match self {
            StatementKind::Select => COD_SELECT,
            StatementKind::Insert => COD_INSERT,
            StatementKind::Update => COD_UPDATE,
            StatementKind::Delete => COD_DELETE,
            StatementKind::Unknown => COD_ERROR,
        }
    }

    /// Whether the statement modifies data and reports an affected-row count.
    pub fn is_update(self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }

    /// Message stored in the envelope after the statement ran.
    pub fn success_message(self) -> &'static str {
        match self {
            StatementKind::Select => "Query executed",
            StatementKind::Insert => "Insert executed",
            StatementKind::Update => "Update executed",
            StatementKind::Delete => "Delete executed",
            StatementKind::Unknown => "Error",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Whether SQL text holds another statement after the first top-level `;`.
///
/// Quoted strings and identifiers (`'..'`, `".."`, `` `..` ``, `[..]`) and
/// comments are skipped, so a `;` inside them does not end the statement. A
/// trailing `;`, whitespace or comment after the end is not a second statement.
pub fn has_trailing_statement(sql: &str) -> bool {
    let mut chars = sql.chars().peekable();
    let mut ended = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                if ended {
                    return true;
                }
                let close = if c == '[' { ']' } else { c };
                // a doubled quote closes and reopens, which skips the same text
                for q in chars.by_ref() {
                    if q == close {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for q in chars.by_ref() {
                    if q == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for q in chars.by_ref() {
                    if prev == '*' && q == '/' {
                        break;
                    }
                    prev = q;
                }
            }
            ';' => ended = true,
            c if c.is_whitespace() => {}
            _ if ended => return true,
            _ => {}
        }
    }
    false
}
