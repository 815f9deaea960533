/// Superquery Error Module
///
/// This module defines the error type shared by every layer of the crate.
/// Driver failures are carried through unchanged so callers can inspect the
/// underlying SQLite error.
use thiserror::Error;

/// Error type for superquery.
///
/// This enum covers the failure scenarios of the helper:
/// - Database driver failures (open, prepare, bind, execute)
/// - Connection holder misuse (double connect, no open connection)
/// - Parameter and configuration problems
/// - Output rendering and export
#[derive(Error, Debug)]
pub enum SuperQueryError {
    /// Errors reported by SQLite through rusqlite
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Statement-level errors that do not originate from the driver
    #[error("Query error: {0}")]
    Query(String),

    /// Connection holder state errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Positional parameter errors
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Result rendering and export errors
    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Type alias for Result to use SuperQueryError as the error type.
pub type Result<T> = std::result::Result<T, SuperQueryError>;

/// Result of a shell command: an optional line of output to show the user.
pub type CommandResult = Result<Option<String>>;
