//! Static table binding for a record type.
//!
//! A [`TableDescriptor`] names the database, table and primary-key column a
//! record type maps to. It is resolved once when a
//! [`Repository`](crate::Repository) is created and shared read-only by
//! every record of that type.
//!
//! Identifiers are restricted to alphanumerics and underscores so they can
//! be interpolated into generated SQL.

use crate::error::{OrmError, Result};

/// Validates that an identifier contains only alphanumeric characters and underscores.
pub(crate) fn validate_identifier(kind: &str, ident: &str) -> Result<()> {
    if ident.is_empty() {
        return Err(OrmError::Validation(format!("{kind} name must not be empty")));
    }
    if !ident.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(OrmError::Validation(format!(
            "invalid {kind} name '{ident}': must contain only alphanumeric characters and underscores"
        )));
    }
    Ok(())
}

/// Double-quotes an already validated identifier.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Database, table and primary-key column of a record type.
///
/// # Examples
///
/// ```
/// use simple_orm_core::TableDescriptor;
///
/// let blog = TableDescriptor::new("main", "blog", "id").unwrap();
/// assert_eq!(blog.qualified_name(), r#""main"."blog""#);
/// assert_eq!(
///     blog.expand_placeholders("SELECT :pk FROM :database.:table"),
///     "SELECT id FROM main.blog"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableDescriptor {
    database: String,
    table: String,
    primary_key: String,
}

impl TableDescriptor {
    /// Creates a descriptor after validating all three identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if any name is empty or contains
    /// characters other than alphanumerics and underscores.
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Result<Self> {
        let descriptor = Self {
            database: database.into(),
            table: table.into(),
            primary_key: primary_key.into(),
        };
        validate_identifier("database", &descriptor.database)?;
        validate_identifier("table", &descriptor.table)?;
        validate_identifier("primary key", &descriptor.primary_key)?;
        Ok(descriptor)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Quoted `"database"."table"` reference for generated statements.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.database), quote_ident(&self.table))
    }

    /// Quoted primary-key column.
    pub fn quoted_primary_key(&self) -> String {
        quote_ident(&self.primary_key)
    }

    /// Substitutes `:database`, `:table` and `:pk` in a literal SQL string.
    pub fn expand_placeholders(&self, sql: &str) -> String {
        sql.replace(":database", &self.database)
            .replace(":table", &self.table)
            .replace(":pk", &self.primary_key)
    }
}
