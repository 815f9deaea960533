/// Connection Management Module
///
/// This module holds the single process-wide database handle: opening it,
/// describing it, running statements on it and closing it.

use super::envelope::ResultEnvelope;
use super::param::Param;
use super::query::execute_super_query;
use crate::core::{Result, SuperQueryError};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Name SQLite uses for a private in-memory database
pub const MEMORY_DATABASE: &str = ":memory:";

/// Extension appended to bare database names
pub const DATABASE_EXTENSION: &str = "db";

/// Name reported as the driver in `DatabaseInfo`
pub const DRIVER_NAME: &str = "rusqlite";

/// Version of the driver bindings this crate is built against
pub const DRIVER_VERSION: &str = "0.29";

/// Global database connection state
///
/// Lazily initialized on first use; every `ConnectionManager::new()` shares it.
static DB_STATE: OnceCell<Arc<Mutex<DbState>>> = OnceCell::new();

/// Internal database state structure
#[derive(Debug, Default)]
pub struct DbState {
    /// Active database connection (None if disconnected)
    connection: Option<Connection>,
    /// Resolved location of the open database
    current_path: Option<PathBuf>,
}

/// Where and how to open a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Directory holding bare-named databases
    pub directory: PathBuf,
    /// Database name, file path, or `:memory:`
    pub database: String,
    /// Open without write access; the file must already exist
    pub read_only: bool,
}

impl ConnectOptions {
    /// Options for a database in the current directory.
    pub fn new(database: impl Into<String>) -> Self {
        ConnectOptions {
            directory: PathBuf::from("."),
            database: database.into(),
            read_only: false,
        }
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Resolves the file SQLite should open.
    ///
    /// `:memory:`, absolute paths and paths with a directory part are used
    /// verbatim. A bare name is placed in `directory`, gaining a `.db`
    /// extension if it has none.
    pub fn resolve_path(&self) -> PathBuf {
        let database = Path::new(&self.database);
        if self.database == MEMORY_DATABASE
            || database.is_absolute()
            || database.components().count() > 1
        {
            return database.to_path_buf();
        }

        let mut path = self.directory.join(database);
        if path.extension().is_none() {
            path.set_extension(DATABASE_EXTENSION);
        }
        path
    }
}

/// Metadata about the open database and the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub database_name: String,
    pub database_version: String,
    pub driver_name: String,
    pub driver_version: String,
}

impl fmt::Display for DatabaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database name: {}", self.database_name)?;
        writeln!(f, "Database version: {}", self.database_version)?;
        writeln!(f, "Driver name: {}", self.driver_name)?;
        write!(f, "Driver version: {}", self.driver_version)
    }
}

/// Holder of the single database connection
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    state: Arc<Mutex<DbState>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Returns a manager for the process-wide connection.
    ///
    /// All managers created this way see the same handle: connecting through
    /// one makes `is_connected()` true for every other.
    pub fn new() -> Self {
        let state = DB_STATE.get_or_init(|| Arc::new(Mutex::new(DbState::default())));
        ConnectionManager {
            state: Arc::clone(state),
        }
    }

    /// Returns a manager with its own, unshared connection slot.
    pub fn standalone() -> Self {
        ConnectionManager {
            state: Arc::new(Mutex::new(DbState::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DbState>> {
        self.state
            .lock()
            .map_err(|_| SuperQueryError::Connection("failed to acquire database lock".to_string()))
    }

    /// Connects to `<name>.db` in the current directory.
    ///
    /// # Errors
    ///
    /// `SuperQueryError::Connection` if a connection is already open,
    /// `SuperQueryError::Database` if SQLite cannot open the file.
    pub fn connect(&self, database_name: &str) -> Result<()> {
        self.connect_with(ConnectOptions::new(database_name))
    }

    /// Connects to `<name>.db` inside `directory`.
    pub fn connect_to(&self, directory: impl Into<PathBuf>, database_name: &str) -> Result<()> {
        self.connect_with(ConnectOptions::new(database_name).directory(directory))
    }

    /// Connects using explicit options.
    pub fn connect_with(&self, options: ConnectOptions) -> Result<()> {
        let mut state = self.lock()?;
        if state.connection.is_some() {
            return Err(SuperQueryError::Connection(
                "a connection is already open".to_string(),
            ));
        }

        let path = options.resolve_path();
        debug!(path = %path.display(), read_only = options.read_only, "opening database");

        let conn = if options.read_only {
            Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            Connection::open(&path)?
        };

        // Initialize connection with common pragmas
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        info!(path = %path.display(), "connected to database");
        state.connection = Some(conn);
        state.current_path = Some(path);
        Ok(())
    }

    /// Checks if there's an active database connection
    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .map(|g| g.connection.is_some())
            .unwrap_or(false)
    }

    /// Gets the resolved path of the open database (if any)
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state.lock().ok()?.current_path.clone()
    }

    /// Describes the open database and the driver.
    pub fn database_info(&self) -> Result<DatabaseInfo> {
        let database_name = self
            .current_path()
            .map(|path| {
                if path == Path::new(MEMORY_DATABASE) {
                    MEMORY_DATABASE.to_string()
                } else {
                    path.file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default()
                }
            })
            .unwrap_or_default();

        self.with_connection(|conn| {
            let database_version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
            Ok(DatabaseInfo {
                database_name,
                database_version,
                driver_name: DRIVER_NAME.to_string(),
                driver_version: DRIVER_VERSION.to_string(),
            })
        })
    }

    /// Runs `f` against the open connection while holding the lock.
    ///
    /// # Errors
    ///
    /// `SuperQueryError::Connection` if no connection is open; otherwise
    /// whatever `f` returns.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let state = self.lock()?;
        match state.connection.as_ref() {
            Some(conn) => f(conn),
            None => Err(SuperQueryError::Connection(
                "no database connection".to_string(),
            )),
        }
    }

    /// Dispatches a statement on the open connection.
    pub fn execute(&self, sql: &str, params: &[Param]) -> Result<ResultEnvelope> {
        self.with_connection(|conn| execute_super_query(conn, sql, params))
    }

    /// Closes the open connection.
    ///
    /// If SQLite refuses to close, the handle stays in place and the error is
    /// returned.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock()?;
        let conn = state
            .connection
            .take()
            .ok_or_else(|| SuperQueryError::Connection("no database connection".to_string()))?;

        if let Err((conn, e)) = conn.close() {
            state.connection = Some(conn);
            return Err(SuperQueryError::Database(e));
        }

        info!("database connection closed");
        state.current_path = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::StatementKind;
    use tempfile::tempdir;

    #[test]
    fn test_connect_and_close() {
        let manager = ConnectionManager::standalone();
        assert!(!manager.is_connected());

        manager.connect(MEMORY_DATABASE).unwrap();
        assert!(manager.is_connected());
        assert_eq!(manager.current_path(), Some(PathBuf::from(MEMORY_DATABASE)));

        manager.close().unwrap();
        assert!(!manager.is_connected());
        assert_eq!(manager.current_path(), None);
    }

    #[test]
    fn test_second_connect_is_rejected() {
        let manager = ConnectionManager::standalone();
        manager.connect(MEMORY_DATABASE).unwrap();

        match manager.connect(MEMORY_DATABASE) {
            Err(SuperQueryError::Connection(msg)) => assert!(msg.contains("already open")),
            other => panic!("Expected Connection error, got {:?}", other),
        }
        // the first handle is still usable
        assert!(manager.execute("SELECT 1", &[]).is_ok());
    }

    #[test]
    fn test_close_without_connection() {
        let manager = ConnectionManager::standalone();
        assert!(matches!(manager.close(), Err(SuperQueryError::Connection(_))));
    }

    #[test]
    fn test_reconnect_after_close() {
        let manager = ConnectionManager::standalone();
        manager.connect(MEMORY_DATABASE).unwrap();
        manager.close().unwrap();
        manager.connect(MEMORY_DATABASE).unwrap();
        assert!(manager.is_connected());
    }

    #[test]
    fn test_execute_requires_connection() {
        let manager = ConnectionManager::standalone();
        let result = manager.execute("SELECT 1", &[]);
        assert!(matches!(result, Err(SuperQueryError::Connection(_))));
    }

    #[test]
    fn test_connect_to_directory_creates_named_file() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::standalone();
        manager.connect_to(dir.path(), "aad").unwrap();

        let envelope = manager.execute("SELECT 1 AS one", &[]).unwrap();
        assert_eq!(envelope.kind, StatementKind::Select);
        assert!(dir.path().join("aad.db").exists());

        let info = manager.database_info().unwrap();
        assert_eq!(info.database_name, "aad");
        assert_eq!(info.driver_name, DRIVER_NAME);
        assert!(!info.database_version.is_empty());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER);")
            .unwrap();

        let manager = ConnectionManager::standalone();
        manager
            .connect_with(ConnectOptions::new(path.to_string_lossy()).read_only(true))
            .unwrap();

        assert!(manager.execute("SELECT * FROM t", &[]).is_ok());
        let result = manager.execute("INSERT INTO t VALUES (1)", &[]);
        assert!(matches!(result, Err(SuperQueryError::Database(_))));
    }

    #[test]
    fn test_connection_error_handling() {
        let manager = ConnectionManager::standalone();
        let result = manager.connect("/nonexistent/path/database.db");
        assert!(matches!(result, Err(SuperQueryError::Database(_))));
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_database_info_display() {
        let manager = ConnectionManager::standalone();
        assert!(manager.database_info().is_err());

        manager.connect(MEMORY_DATABASE).unwrap();
        let rendered = manager.database_info().unwrap().to_string();
        assert!(rendered.starts_with("Database name: :memory:\n"));
        assert!(rendered.contains("Driver name: rusqlite"));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ConnectOptions::new("aad").resolve_path(),
            PathBuf::from("./aad.db")
        );
        assert_eq!(
            ConnectOptions::new("aad").directory("/data").resolve_path(),
            PathBuf::from("/data/aad.db")
        );
        assert_eq!(
            ConnectOptions::new("shop.sqlite").directory("/data").resolve_path(),
            PathBuf::from("/data/shop.sqlite")
        );
        assert_eq!(
            ConnectOptions::new("sub/shop.db").directory("/data").resolve_path(),
            PathBuf::from("sub/shop.db")
        );
        assert_eq!(
            ConnectOptions::new(MEMORY_DATABASE).directory("/data").resolve_path(),
            PathBuf::from(MEMORY_DATABASE)
        );
    }

    #[test]
    fn test_global_manager_is_shared() {
        let first = ConnectionManager::new();
        let second = ConnectionManager::new();

        first.connect(MEMORY_DATABASE).unwrap();
        assert!(second.is_connected());
        assert!(second.connect(MEMORY_DATABASE).is_err());

        second.close().unwrap();
        assert!(!first.is_connected());
    }
}
