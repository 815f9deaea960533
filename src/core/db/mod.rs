/// Database Module
///
/// This module provides the database functionality of superquery, organized
/// into focused submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): the single process-wide handle
/// - **Statement Classification** (`statement.rs`): SELECT/INSERT/UPDATE/DELETE and status codes
/// - **Parameters** (`param.rs`): typed positional values bound to `?` placeholders
/// - **Query Execution** (`query.rs`): dispatches a statement to query or update execution
/// - **Result Envelope** (`envelope.rs`): status code, message, affected rows and rows
///
/// ## Error Handling
///
/// All database operations use `SuperQueryError`; driver errors are passed through
/// as `SuperQueryError::Database`.
pub mod connection;
pub mod envelope;
pub mod param;
pub mod query;
pub mod statement;

pub use connection::*;
pub use envelope::*;
pub use param::*;
pub use query::*;
pub use statement::*;
