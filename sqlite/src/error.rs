//! Error types for the SQLite backend.
//!
//! Driver-level failures surface through [`SqliteError`]; once they cross
//! the [`Connection`](simple_orm_core::Connection) boundary they are boxed
//! into the core [`OrmError`] taxonomy.

use simple_orm_core::OrmError;
use thiserror::Error;

/// Errors raised while opening or configuring a SQLite session.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Configuration file could not be parsed or written.
    #[error("config error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    /// Configuration file could not be read or created.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The named database is not attached to the connection.
    #[error("unknown database '{0}'")]
    UnknownDatabase(String),

    /// A record operation failed.
    #[error(transparent)]
    Orm(#[from] OrmError),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
