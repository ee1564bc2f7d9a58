//! YAML connection configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/blog.db
//! database: main
//! schema_cache: true
//! foreign_keys: true
//! attach:
//!   archive: data/archive.db
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use simple_orm_core::Session;
use tracing::info;

use crate::connection::SqliteConnection;
use crate::error::Result;

/// Path that opens a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

fn default_database() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

/// How to open a [`Session`] on SQLite.
///
/// # Examples
///
/// ```
/// use simple_orm_sqlite::ConnectionConfig;
///
/// let config = ConnectionConfig::in_memory();
/// let session = config.open().unwrap();
/// assert_eq!(session.database(), "main");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// Default database selected on the session.
    #[serde(default = "default_database")]
    pub database: String,
    /// Cache column lists for the lifetime of the session.
    #[serde(default)]
    pub schema_cache: bool,
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    /// Extra database files attached by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attach: BTreeMap<String, PathBuf>,
}

impl ConnectionConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            database: default_database(),
            schema_cache: false,
            foreign_keys: true,
            attach: BTreeMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::SqliteError::IoError) if the file cannot
    /// be read, or [`ConfigError`](crate::SqliteError::ConfigError) if
    /// parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Opens the connection, attaches extra databases and starts a session.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`](crate::SqliteError::DatabaseError) if a
    /// file cannot be opened or attached, and
    /// [`Orm`](crate::SqliteError::Orm) if the default database cannot be
    /// selected.
    pub fn open(&self) -> Result<Session> {
        let conn = if self.is_in_memory() {
            SqliteConnection::open_in_memory()?
        } else {
            SqliteConnection::open(&self.path)?
        };
        conn.set_foreign_keys(self.foreign_keys)?;
        for (name, path) in &self.attach {
            conn.attach(name, path)?;
        }

        let mut session = Session::use_connection(conn, self.database.as_str())?;
        if self.schema_cache {
            session = session.with_schema_cache();
        }
        info!(
            path = %self.path.display(),
            database = %self.database,
            schema_cache = self.schema_cache,
            "session opened"
        );
        Ok(session)
    }
}
