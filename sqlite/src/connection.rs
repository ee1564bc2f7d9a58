//! [`Connection`] implementation on top of `rusqlite`.
//!
//! SQLite names its databases `main`, `temp` and whatever has been
//! attached. Selecting a database only checks that it exists; statements
//! address tables as `"database"."table"` explicitly.
//!
//! # Example
//!
//! ```
//! use simple_orm_core::Session;
//! use simple_orm_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! conn.execute_batch("CREATE TABLE blog (id INTEGER PRIMARY KEY, title TEXT);").unwrap();
//!
//! let session = Session::use_connection(conn, "main").unwrap();
//! let columns = session.connection().describe("main", "blog").unwrap();
//! assert_eq!(columns, ["id", "title"]);
//! ```

use std::collections::VecDeque;
use std::path::Path;

use rusqlite::{OptionalExtension, params_from_iter};
use rusqlite::types::{Value as SqlValue, ValueRef};
use simple_orm_core::{
    AttributeMap, BindType, Connection, DriverError, ExecOutcome, RowSet, Statement, Value,
};
use tracing::debug;

use crate::error::{Result, SqliteError};

/// SQLite connection handle.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// Wraps an already-open `rusqlite` connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Runs one or more semicolon-separated statements, typically DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Turns foreign-key enforcement on or off.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let flag = if enabled { "ON" } else { "OFF" };
        self.conn.execute_batch(&format!("PRAGMA foreign_keys = {flag};"))?;
        Ok(())
    }

    /// Attaches the database file at `path` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::UnknownDatabase`] if `name` is not a plain
    /// identifier.
    pub fn attach(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(SqliteError::UnknownDatabase(name.to_string()));
        }
        let path = path.as_ref().to_string_lossy();
        self.conn
            .execute(&format!("ATTACH DATABASE ?1 AS \"{name}\""), [&*path])?;
        debug!(database = name, path = %path, "database attached");
        Ok(())
    }

    /// Names of every database visible on this connection.
    pub fn database_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_database_list")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Whether `table` stores a rowid, or `None` if it cannot be found.
    ///
    /// An unqualified name matches the first schema that has it.
    pub fn has_rowid(&self, database: Option<&str>, table: &str) -> Result<Option<bool>> {
        let without_rowid = self
            .conn
            .query_row(
                "SELECT wr FROM pragma_table_list \
                 WHERE name = ?1 AND (?2 IS NULL OR schema = ?2) AND type = 'table'",
                rusqlite::params![table, database],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(without_rowid.map(|wr| !wr))
    }

    /// The underlying `rusqlite` connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Connection for SqliteConnection {
    fn select_database(&self, name: &str) -> std::result::Result<(), DriverError> {
        if self.database_names()?.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(SqliteError::UnknownDatabase(name.to_string()).into())
        }
    }

    fn query(&self, sql: &str) -> std::result::Result<Box<dyn RowSet + '_>, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() == 0 {
            let affected = stmt.execute([])?;
            debug!(affected, "statement without result columns");
            return Ok(Box::new(SqliteRows::default()));
        }

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;
        let mut buffered = VecDeque::new();
        while let Some(row) = rows.next()? {
            let mut map = AttributeMap::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                map.insert(name.as_str(), from_sql(row.get_ref(i)?));
            }
            buffered.push_back(map);
        }
        Ok(Box::new(SqliteRows { rows: buffered }))
    }

    fn prepare(&self, sql: &str) -> std::result::Result<Box<dyn Statement + '_>, DriverError> {
        let stmt = self.conn.prepare(sql)?;
        let key_source = match insert_target(sql) {
            Some((database, table)) => match self.has_rowid(database.as_deref(), &table)? {
                Some(true) => KeySource::Rowid,
                Some(false) => KeySource::None,
                None => KeySource::RowidChange,
            },
            None if is_insert(sql) => KeySource::RowidChange,
            None => KeySource::None,
        };
        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            stmt,
            key_source,
            values: Vec::new(),
        }))
    }

    fn describe(&self, database: &str, table: &str) -> std::result::Result<Vec<String>, DriverError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1, ?2) ORDER BY cid")?;
        let columns = stmt
            .query_map([table, database], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(format!("no such table: {database}.{table}").into());
        }
        Ok(columns)
    }
}

/// Where an executed statement's generated key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySource {
    /// Not an insert, or an insert into a `WITHOUT ROWID` table.
    None,
    /// Insert into a rowid table: every inserted row gets a new rowid.
    Rowid,
    /// Insert into a table that could not be resolved; trust the rowid
    /// only if it moved.
    RowidChange,
}

struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: rusqlite::Statement<'c>,
    key_source: KeySource,
    values: Vec<SqlValue>,
}

impl Statement for SqliteStatement<'_> {
    fn bind_typed(&mut self, types: &[BindType], values: &[Value]) -> std::result::Result<(), DriverError> {
        let expected = self.stmt.parameter_count();
        if types.len() != values.len() || values.len() != expected {
            return Err(format!(
                "statement takes {expected} parameters, got {} types and {} values",
                types.len(),
                values.len()
            )
            .into());
        }
        self.values = types
            .iter()
            .zip(values)
            .map(|(ty, value)| to_sql(*ty, value))
            .collect();
        Ok(())
    }

    fn execute(&mut self) -> std::result::Result<ExecOutcome, DriverError> {
        let before = self.conn.last_insert_rowid();
        let affected_rows = self.stmt.execute(params_from_iter(self.values.iter()))?;
        let after = self.conn.last_insert_rowid();
        let generated_key = match self.key_source {
            KeySource::None => None,
            KeySource::Rowid => (affected_rows > 0).then_some(after),
            KeySource::RowidChange => (affected_rows > 0 && after != before).then_some(after),
        };
        Ok(ExecOutcome {
            affected_rows,
            generated_key,
        })
    }
}

#[derive(Default)]
struct SqliteRows {
    rows: VecDeque<AttributeMap>,
}

impl RowSet for SqliteRows {
    fn next_row(&mut self) -> std::result::Result<Option<AttributeMap>, DriverError> {
        Ok(self.rows.pop_front())
    }
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

/// Splits the target of `INSERT [OR ...] INTO [db.]table` into its parts.
fn insert_target(sql: &str) -> Option<(Option<String>, String)> {
    if !is_insert(sql) {
        return None;
    }
    let upper = sql.to_ascii_uppercase();
    let start = upper.find(" INTO ")? + " INTO ".len();
    let (first, rest) = identifier(sql[start..].trim_start())?;
    match rest.strip_prefix('.') {
        Some(rest) => {
            let (table, _) = identifier(rest)?;
            Some((Some(first), table))
        }
        None => Some((None, first)),
    }
}

/// Reads one plain or double-quoted identifier off the front of `s`.
fn identifier(s: &str) -> Option<(String, &str)> {
    if let Some(quoted) = s.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some((quoted[..end].to_string(), &quoted[end + 1..]));
    }
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    (end > 0).then(|| (s[..end].to_string(), &s[end..]))
}

/// Converts a bound value according to its declared type.
fn to_sql(ty: BindType, value: &Value) -> SqlValue {
    match (ty, value) {
        (_, Value::Null) => SqlValue::Null,
        (BindType::Integer, Value::Float(f)) => SqlValue::Integer(*f as i64),
        (BindType::Integer, v) => v
            .as_i64()
            .map(SqlValue::Integer)
            .unwrap_or_else(|| SqlValue::Text(v.to_string())),
        (BindType::Float, Value::Float(f)) => SqlValue::Real(*f),
        (BindType::Float, Value::Integer(i)) => SqlValue::Real(*i as f64),
        (BindType::Float, v) => v
            .to_string()
            .trim()
            .parse()
            .map(SqlValue::Real)
            .unwrap_or_else(|_| SqlValue::Text(v.to_string())),
        (BindType::Text, v) => SqlValue::Text(v.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}
