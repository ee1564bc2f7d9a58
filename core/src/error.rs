//! Error types for record lifecycle operations.
//!
//! Every failure surfaces immediately as an [`OrmError`]; nothing in the
//! engine retries or recovers. Statement-level failures carry the generated
//! SQL so callers can log or display it.

use thiserror::Error;

/// Opaque error reported by a connection capability.
///
/// Drivers box their native error type so the engine can wrap it together
/// with the SQL that triggered it.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while loading, persisting or querying records.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A primary-key load matched zero rows.
    #[error("{entity} record not found in database (PK: {pk})")]
    NotFound { entity: &'static str, pk: String },

    /// The caller supplied a malformed argument.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The connection could not compile a generated statement.
    #[error("failed to prepare statement: {source}\n\n{sql}")]
    Preparation {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// A compiled statement executed but storage reported a runtime error.
    #[error("failed to execute statement: {source}\n\n{sql}")]
    Execution {
        sql: String,
        #[source]
        source: DriverError,
    },

    /// Update or delete attempted on a record that was never persisted.
    #[error("unable to {operation} record, record is new")]
    State { operation: &'static str },

    /// A convention call did not match any recognized pattern.
    #[error("there is no method named \"{method}\" on \"{entity}\"")]
    Dispatch { entity: &'static str, method: String },

    /// Column introspection failed.
    #[error("unable to fetch the column names of {table}: {source}")]
    Schema {
        table: String,
        #[source]
        source: DriverError,
    },
}

impl OrmError {
    pub(crate) fn preparation(sql: impl Into<String>, source: DriverError) -> Self {
        Self::Preparation {
            sql: sql.into(),
            source,
        }
    }

    pub(crate) fn execution(sql: impl Into<String>, source: DriverError) -> Self {
        Self::Execution {
            sql: sql.into(),
            source,
        }
    }

    /// Returns the generated SQL attached to this error, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Preparation { sql, .. } | Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`OrmError`].
pub type Result<T> = std::result::Result<T, OrmError>;
