/// # Test Utilities Module
///
/// Shared fixtures for unit tests: an in-memory employees database, reachable
/// either as a bare connection or through an isolated connection holder.

use crate::core::db::{ConnectionManager, MEMORY_DATABASE};
use rusqlite::Connection;

const EMPLOYEES_SCHEMA: &str = "
    CREATE TABLE dept (
        dept_no INTEGER PRIMARY KEY,
        dname TEXT NOT NULL
    );
    CREATE TABLE emp (
        emp_no INTEGER PRIMARY KEY,
        ename TEXT NOT NULL,
        sal REAL,
        dept_no INTEGER REFERENCES dept (dept_no)
    );
    INSERT INTO dept VALUES (10, 'ACCOUNTING'), (20, 'RESEARCH'), (30, 'SALES');
    INSERT INTO emp VALUES (7369, 'SMITH', 800, 20);
    INSERT INTO emp VALUES (7499, 'ALLEN', 1600, 30);
    INSERT INTO emp VALUES (7521, 'WARD', 1250, 30);
    INSERT INTO emp VALUES (7566, 'JONES', 2975, 20);
";

/// In-memory database seeded with `dept` and `emp` tables
pub struct EmployeesFixture {
    pub connection: Connection,
}

impl EmployeesFixture {
    pub fn new() -> Self {
        let connection = Connection::open_in_memory().expect("in-memory database");
        connection
            .execute_batch(EMPLOYEES_SCHEMA)
            .expect("employees schema");
        EmployeesFixture { connection }
    }

    /// A standalone connection holder with the employees tables loaded.
    pub fn manager() -> ConnectionManager {
        let manager = ConnectionManager::standalone();
        manager.connect(MEMORY_DATABASE).expect("connect to :memory:");
        manager
            .with_connection(|conn| Ok(conn.execute_batch(EMPLOYEES_SCHEMA)?))
            .expect("employees schema");
        manager
    }
}
