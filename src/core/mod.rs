/// Core Module for superquery
///
/// Shared infrastructure: the database layer (connection holder, statement
/// dispatch, result envelope) and the crate-wide error type.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{CommandResult, Result, SuperQueryError};
