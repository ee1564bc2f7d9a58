//! Capabilities the engine consumes from a database driver.
//!
//! The engine never talks to a database directly. A driver implements
//! [`Connection`] (plain queries, prepared statements, column
//! introspection) and the engine wraps every [`DriverError`] with the SQL
//! that caused it.

use crate::attributes::AttributeMap;
use crate::error::DriverError;
use crate::value::{BindType, Value};

/// Driver-side connection handle.
///
/// All calls block until the driver returns.
pub trait Connection {
    /// Makes `name` the default database for subsequent statements.
    fn select_database(&self, name: &str) -> Result<(), DriverError>;

    /// Runs a literal SQL string and returns its rows.
    ///
    /// Statements that produce no result columns (DDL, `DELETE`, ...)
    /// return an empty row set.
    fn query(&self, sql: &str) -> Result<Box<dyn RowSet + '_>, DriverError>;

    /// Compiles `sql` into a statement with positional `?` parameters.
    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError>;

    /// Returns the ordered column names of `database.table`.
    fn describe(&self, database: &str, table: &str) -> Result<Vec<String>, DriverError>;
}

/// A compiled, parameterized statement.
pub trait Statement {
    /// Binds one value per parameter, each with its declared type.
    fn bind_typed(&mut self, types: &[BindType], values: &[Value]) -> Result<(), DriverError>;

    /// Executes the statement with the bound values.
    fn execute(&mut self) -> Result<ExecOutcome, DriverError>;
}

/// Result of executing a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub affected_rows: usize,
    /// Key generated by storage for an insert, if any.
    pub generated_key: Option<i64>,
}

/// Forward-only cursor over query results.
pub trait RowSet {
    /// Returns the next row keyed by column name, or `None` at the end.
    fn next_row(&mut self) -> Result<Option<AttributeMap>, DriverError>;

    /// Releases the cursor.
    fn close(self: Box<Self>) {}
}
