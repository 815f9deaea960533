/// Query Execution Module
///
/// Dispatches SQL text to query or update execution based on its statement
/// kind and wraps the outcome in a `ResultEnvelope`.

use super::envelope::{CellValue, ResultEnvelope, RowSet};
use super::param::Param;
use super::statement::{has_trailing_statement, StatementKind};
use crate::core::{Result, SuperQueryError};
use rusqlite::{params_from_iter, Connection, Params, Statement};
use tracing::{debug, warn};

/// Query execution service that operates on a database connection
pub struct QueryExecutor<'a> {
    connection: &'a Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a Connection) -> Self {
        QueryExecutor { connection }
    }

    /// Executes a statement and returns its result envelope.
    ///
    /// Without parameters the statement runs as plain SQL; with parameters it
    /// is prepared and the values are bound positionally, in order. Both paths
    /// classify the statement the same way:
    ///
    /// * SELECT: rows are read and returned with code 10
    /// * INSERT/UPDATE/DELETE: the affected-row count is returned with code 20/30/40
    /// * anything else: not executed, an error envelope (code -1) is returned
    ///
    /// # Errors
    ///
    /// Returns `SuperQueryError::Query` when the text holds more than one
    /// statement; nothing is executed in that case. Returns
    /// `SuperQueryError::Database` when SQLite rejects the statement (syntax,
    /// missing table, constraint, parameter count).
    pub fn execute(&self, sql: &str, params: &[Param]) -> Result<ResultEnvelope> {
        let kind = StatementKind::from_sql(sql);
        debug!(%kind, params = params.len(), "dispatching statement");

        if kind == StatementKind::Unknown {
            warn!(sql = sql.trim(), "statement is not a SELECT, INSERT, UPDATE or DELETE");
            return Ok(ResultEnvelope::error());
        }

        if has_trailing_statement(sql) {
            warn!(sql = sql.trim(), "rejecting text with more than one statement");
            return Err(SuperQueryError::Query(
                "only one statement can be executed at a time".to_string(),
            ));
        }

        let envelope = if params.is_empty() {
            self.execute_plain(kind, sql)?
        } else {
            self.execute_prepared(kind, sql, params)?
        };

        debug!(
            code = envelope.code,
            affected_rows = envelope.affected_rows,
            rows = envelope.rows().map_or(0, RowSet::row_count),
            "statement executed"
        );
        Ok(envelope)
    }

    fn execute_plain(&self, kind: StatementKind, sql: &str) -> Result<ResultEnvelope> {
        if kind.is_update() {
            let affected = self.connection.execute(sql, [])?;
            return Ok(ResultEnvelope::updated(kind, affected as i64));
        }

        let mut stmt = self.connection.prepare(sql)?;
        let rows = collect_rows(&mut stmt, [])?;
        Ok(ResultEnvelope::selected(rows))
    }

    fn execute_prepared(
        &self,
        kind: StatementKind,
        sql: &str,
        params: &[Param],
    ) -> Result<ResultEnvelope> {
        let mut stmt = self.connection.prepare(sql)?;

        if kind.is_update() {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            return Ok(ResultEnvelope::updated(kind, affected as i64));
        }

        let rows = collect_rows(&mut stmt, params_from_iter(params.iter()))?;
        Ok(ResultEnvelope::selected(rows))
    }
}

/// Reads every row of a query into a `RowSet`, keeping values typed.
fn collect_rows<P: Params>(stmt: &mut Statement<'_>, params: P) -> Result<RowSet> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = columns.len();

    let rows = stmt
        .query_map(params, |row| {
            (0..column_count)
                .map(|i| row.get_ref(i).map(CellValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(RowSet::new(columns, rows))
}

/// Convenience function to dispatch a statement on a connection
///
/// # Arguments
///
/// * `conn` - Database connection to execute the statement on
/// * `sql` - SQL text; its leading keyword decides how it runs
/// * `params` - Positional parameters, empty for a plain statement
pub fn execute_super_query(conn: &Connection, sql: &str, params: &[Param]) -> Result<ResultEnvelope> {
    QueryExecutor::new(conn).execute(sql, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EmployeesFixture;

    #[test]
    fn test_plain_select() {
        let fixture = EmployeesFixture::new();
        let envelope =
            execute_super_query(&fixture.connection, "SELECT emp_no, ename FROM emp ORDER BY emp_no", &[])
                .unwrap();

        assert_eq!(envelope.code, 10);
        assert_eq!(envelope.message, "Query executed");
        assert_eq!(envelope.affected_rows, 0);

        let rows = envelope.rows().unwrap();
        assert_eq!(rows.columns, vec!["emp_no", "ename"]);
        assert_eq!(rows.row_count(), 4);
        assert_eq!(rows.rows[0], vec![CellValue::Integer(7369), CellValue::Text("SMITH".to_string())]);
    }

    #[test]
    fn test_prepared_select() {
        let fixture = EmployeesFixture::new();
        let envelope = execute_super_query(
            &fixture.connection,
            "SELECT ename, sal FROM emp WHERE emp_no = ?",
            &[Param::from(7369)],
        )
        .unwrap();

        assert_eq!(envelope.code, 10);
        let rows = envelope.rows().unwrap();
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.get(0, "sal"), Some(&CellValue::Real(800.0)));
    }

    #[test]
    fn test_plain_updates_report_affected_rows() {
        let fixture = EmployeesFixture::new();
        let conn = &fixture.connection;

        let insert = execute_super_query(
            conn,
            "INSERT INTO emp (emp_no, ename, sal, dept_no) VALUES (8000, 'KING', 5000, 10)",
            &[],
        )
        .unwrap();
        assert_eq!((insert.code, insert.affected_rows), (20, 1));
        assert_eq!(insert.message, "Insert executed");
        assert!(insert.rows().is_none());

        let update = execute_super_query(conn, "UPDATE emp SET sal = sal + 100 WHERE dept_no = 20", &[]).unwrap();
        assert_eq!((update.code, update.affected_rows), (30, 2));
        assert_eq!(update.message, "Update executed");

        let delete = execute_super_query(conn, "DELETE FROM emp WHERE dept_no = 99", &[]).unwrap();
        assert_eq!((delete.code, delete.affected_rows), (40, 0));
        assert_eq!(delete.message, "Delete executed");
    }

    #[test]
    fn test_prepared_update_binds_in_order() {
        let fixture = EmployeesFixture::new();
        let conn = &fixture.connection;

        let update = execute_super_query(
            conn,
            "UPDATE emp SET ename = ?, sal = ? WHERE emp_no = ?",
            &[Param::from("SMYTHE"), Param::from(950.5), Param::from(7369)],
        )
        .unwrap();
        assert_eq!(update.affected_rows, 1);

        let (name, sal): (String, f64) = conn
            .query_row("SELECT ename, sal FROM emp WHERE emp_no = 7369", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "SMYTHE");
        assert_eq!(sal, 950.5);
    }

    #[test]
    fn test_unknown_statement_is_not_executed() {
        let fixture = EmployeesFixture::new();
        let conn = &fixture.connection;

        let envelope = execute_super_query(conn, "DROP TABLE emp", &[]).unwrap();
        assert!(envelope.is_error());
        assert_eq!(envelope.affected_rows, -1);
        assert!(envelope.rows().is_none());

        let prepared = execute_super_query(conn, "DROP TABLE emp", &[Param::from(1)]).unwrap();
        assert!(prepared.is_error());

        // the table is still there
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM emp", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_driver_errors_propagate() {
        let fixture = EmployeesFixture::new();
        let result = execute_super_query(&fixture.connection, "SELECT * FROM nonexistent_table", &[]);

        match result {
            Err(SuperQueryError::Database(e)) => assert!(e.to_string().contains("no such table")),
            other => panic!("Expected Database error, got {:?}", other),
        }

        let result = execute_super_query(
            &fixture.connection,
            "SELECT * FROM emp WHERE emp_no = ?",
            &[Param::from(1), Param::from(2)],
        );
        assert!(matches!(result, Err(SuperQueryError::Database(_))));
    }

    #[test]
    fn test_constraint_violation_propagates() {
        let fixture = EmployeesFixture::new();
        let result = execute_super_query(
            &fixture.connection,
            "INSERT INTO emp (emp_no, ename, sal, dept_no) VALUES (?, ?, ?, ?)",
            &[Param::from(7369), Param::from("DUP"), Param::from(1.0), Param::from(10)],
        );
        assert!(matches!(result, Err(SuperQueryError::Database(_))));
    }

    #[test]
    fn test_null_and_blob_cells() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE blobs (id INTEGER, data BLOB);
             INSERT INTO blobs VALUES (1, X'48656C6C6F'), (2, NULL);",
        )
        .unwrap();

        let envelope = execute_super_query(&conn, "select data from blobs order by id", &[]).unwrap();
        let rows = envelope.rows().unwrap();
        assert_eq!(rows.rows[0][0].to_string(), "<BLOB: 5 bytes>");
        assert_eq!(rows.rows[1][0], CellValue::Null);
    }

    #[test]
    fn test_multiple_statements_are_rejected() {
        let fixture = EmployeesFixture::new();
        let conn = &fixture.connection;

        let result = execute_super_query(conn, "DELETE FROM emp WHERE emp_no = 7369; DROP TABLE emp", &[]);
        match result {
            Err(SuperQueryError::Query(msg)) => assert!(msg.contains("one statement")),
            other => panic!("Expected Query error, got {:?}", other),
        }

        let result = execute_super_query(
            conn,
            "SELECT ename FROM emp WHERE emp_no = ?; DELETE FROM emp",
            &[Param::from(7369)],
        );
        assert!(matches!(result, Err(SuperQueryError::Query(_))));

        // neither the delete nor the drop ran
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM emp", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_trailing_semicolon_and_quoted_semicolons_are_accepted() {
        let fixture = EmployeesFixture::new();
        let conn = &fixture.connection;

        let envelope = execute_super_query(conn, "SELECT ename FROM emp WHERE emp_no = 7369; -- smith", &[]).unwrap();
        assert_eq!(envelope.rows().unwrap().row_count(), 1);

        let envelope = execute_super_query(
            conn,
            "UPDATE emp SET ename = 'A;B' WHERE emp_no = ?;",
            &[Param::from(7499)],
        )
        .unwrap();
        assert_eq!(envelope.affected_rows, 1);

        let name: String = conn
            .query_row("SELECT ename FROM emp WHERE emp_no = 7499", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "A;B");
    }
}
