//! Explicit connection context shared by every repository.
//!
//! A [`Session`] owns the driver connection, the default database name and
//! the schema introspector. It is created once, before any record
//! operation, and handed to each [`Repository`] by reference.

use tracing::debug;

use crate::connection::Connection;
use crate::descriptor::validate_identifier;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::repository::Repository;
use crate::schema::SchemaIntrospector;

/// Connection handle plus default database.
///
/// # Examples
///
/// ```ignore
/// use simple_orm_core::Session;
///
/// let session = Session::use_connection(conn, "main")?;
/// let blogs = session.repository::<Blog>()?;
/// let entry = blogs.retrieve_by_pk(1)?;
/// ```
pub struct Session {
    conn: Box<dyn Connection>,
    database: String,
    schema: SchemaIntrospector,
}

impl Session {
    /// Wraps `conn` and selects `database` as the default.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if the database name is not a plain
    /// identifier or the connection cannot select it.
    pub fn use_connection(conn: impl Connection + 'static, database: impl Into<String>) -> Result<Self> {
        let database = database.into();
        validate_identifier("database", &database)?;
        conn.select_database(&database).map_err(|e| {
            OrmError::Validation(format!("unable to select database '{database}': {e}"))
        })?;
        debug!(database = %database, "session opened");

        Ok(Self {
            conn: Box::new(conn),
            database,
            schema: SchemaIntrospector::uncached(),
        })
    }

    /// Enables the column-list cache for this session.
    pub fn with_schema_cache(mut self) -> Self {
        self.schema = SchemaIntrospector::cached();
        self
    }

    /// Binds record type `E` to this session.
    ///
    /// The table descriptor and filter registration are resolved here, once.
    pub fn repository<E: Entity>(&self) -> Result<Repository<'_, E>> {
        Repository::new(self)
    }

    pub fn connection(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    /// Default database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &SchemaIntrospector {
        &self.schema
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.database)
            .field("schema_cache", &self.schema.is_cached())
            .finish_non_exhaustive()
    }
}
