//! SQL generation for record persistence.
//!
//! [`SqlBuilder`] turns a record's attribute map into parameterized
//! `INSERT`, `UPDATE` and `DELETE` statements, and renders the literal
//! `SELECT`s used by loads and field lookups.
//!
//! # Write set
//!
//! Before an insert or update, the full attribute map is folded through the
//! input filters, narrowed to the columns reported by schema introspection
//! (unknown keys are dropped silently), and stripped of the primary key
//! when the [`WritePolicy`] says so. Surviving columns keep map order.

use crate::attributes::AttributeMap;
use crate::descriptor::{TableDescriptor, quote_ident, validate_identifier};
use crate::error::Result;
use crate::filter::FilterPipeline;
use crate::value::{BindType, Value, quote_literal};

/// Whether the primary-key column participates in writes.
///
/// Both flags default to `true`: the key is left to storage on insert and
/// is never rewritten on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    pub ignore_key_on_insert: bool,
    pub ignore_key_on_update: bool,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl WritePolicy {
    pub const DEFAULT: Self = Self {
        ignore_key_on_insert: true,
        ignore_key_on_update: true,
    };
}

/// Requested shape of a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// No rows expected (DDL and maintenance statements).
    None,
    /// The first row, or nothing.
    One,
    /// Every row (the default).
    #[default]
    Many,
}

/// A parameterized statement ready to prepare and bind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub types: Vec<BindType>,
    pub values: Vec<Value>,
}

impl CompiledStatement {
    /// Bind types as a compact code string such as `"ssi"`.
    pub fn type_codes(&self) -> String {
        self.types.iter().map(|t| t.code()).collect()
    }
}

/// Statement compiler bound to one table.
///
/// # Examples
///
/// ```
/// use simple_orm_core::{AttributeMap, FilterPipeline, SqlBuilder, TableDescriptor, WritePolicy};
///
/// let table = TableDescriptor::new("main", "blog", "id").unwrap();
/// let filters = FilterPipeline::new();
/// let builder = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT);
///
/// let columns = vec!["id".to_string(), "title".to_string(), "body".to_string()];
/// let mut map = AttributeMap::new();
/// map.insert("id", None::<i64>);
/// map.insert("title", "Hello");
/// map.insert("extra", 1);
///
/// let stmt = builder.insert(map, &columns);
/// assert_eq!(stmt.sql, r#"INSERT INTO "main"."blog" ("title") VALUES (?)"#);
/// assert_eq!(stmt.type_codes(), "s");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder<'a> {
    table: &'a TableDescriptor,
    filters: &'a FilterPipeline,
    policy: WritePolicy,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(table: &'a TableDescriptor, filters: &'a FilterPipeline, policy: WritePolicy) -> Self {
        Self {
            table,
            filters,
            policy,
        }
    }

    /// Applies input filters, schema narrowing and the key policy.
    pub fn write_set(&self, attributes: AttributeMap, columns: &[String], drop_key: bool) -> AttributeMap {
        let mut set = self.filters.apply_input(attributes);
        set.retain_columns(columns);
        if drop_key {
            set.remove(self.table.primary_key());
        }
        set
    }

    /// Compiles an `INSERT` for the surviving columns of `attributes`.
    ///
    /// An empty write set yields `INSERT ... DEFAULT VALUES`.
    pub fn insert(&self, attributes: AttributeMap, columns: &[String]) -> CompiledStatement {
        let set = self.write_set(attributes, columns, self.policy.ignore_key_on_insert);

        if set.is_empty() {
            return CompiledStatement {
                sql: format!("INSERT INTO {} DEFAULT VALUES", self.table.qualified_name()),
                types: Vec::new(),
                values: Vec::new(),
            };
        }

        let names: Vec<String> = set.keys().map(quote_ident).collect();
        let markers = vec!["?"; set.len()].join(", ");
        let (types, values) = split_binds(set);

        CompiledStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table.qualified_name(),
                names.join(", "),
                markers
            ),
            types,
            values,
        }
    }

    /// Compiles an `UPDATE ... WHERE pk = ?` keyed on `key`.
    ///
    /// Returns `None` when no column survives narrowing, since there is
    /// nothing to `SET`.
    pub fn update(&self, attributes: AttributeMap, columns: &[String], key: &Value) -> Option<CompiledStatement> {
        let set = self.write_set(attributes, columns, self.policy.ignore_key_on_update);
        if set.is_empty() {
            return None;
        }

        let assignments: Vec<String> = set.keys().map(|k| format!("{} = ?", quote_ident(k))).collect();
        let (mut types, mut values) = split_binds(set);
        types.push(key.bind_type());
        values.push(key.clone());

        Some(CompiledStatement {
            sql: format!(
                "UPDATE {} SET {} WHERE {} = ?",
                self.table.qualified_name(),
                assignments.join(", "),
                self.table.quoted_primary_key()
            ),
            types,
            values,
        })
    }

    /// Compiles a `DELETE ... WHERE pk = ?` keyed on `key`.
    pub fn delete(&self, key: &Value) -> CompiledStatement {
        CompiledStatement {
            sql: format!(
                "DELETE FROM {} WHERE {} = ?",
                self.table.qualified_name(),
                self.table.quoted_primary_key()
            ),
            types: vec![key.bind_type()],
            values: vec![key.clone()],
        }
    }

    /// Literal `SELECT` of the row whose primary key equals `key`.
    pub fn select_by_key(&self, key: &Value) -> String {
        format!(
            "SELECT * FROM {} WHERE {} = {}",
            self.table.qualified_name(),
            self.table.quoted_primary_key(),
            key.to_sql_literal()
        )
    }

    /// Literal `SELECT` matching `field` against `value`.
    ///
    /// The predicate is `LIKE` when the value contains `%`, `=` otherwise;
    /// the value is always compared as a quoted string. [`Cardinality::One`]
    /// appends `LIMIT 1`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`](crate::OrmError::Validation) if
    /// `field` is not a plain identifier.
    pub fn select_by_field(&self, field: &str, value: &Value, cardinality: Cardinality) -> Result<String> {
        validate_identifier("field", field)?;
        let text = value.to_string();
        let op = if text.contains('%') { "LIKE" } else { "=" };

        let mut sql = format!(
            "SELECT * FROM {} WHERE {} {} {}",
            self.table.qualified_name(),
            quote_ident(field),
            op,
            quote_literal(&text)
        );
        if cardinality == Cardinality::One {
            sql.push_str(" LIMIT 1");
        }
        Ok(sql)
    }

    /// Literal `SELECT` of every row, with an optional raw `WHERE` clause.
    pub fn select_all(&self, where_clause: Option<&str>) -> String {
        match where_clause {
            Some(clause) => format!("SELECT * FROM {} WHERE {clause}", self.table.qualified_name()),
            None => format!("SELECT * FROM {}", self.table.qualified_name()),
        }
    }

    /// Statement removing every row of the table.
    pub fn truncate(&self) -> String {
        format!("DELETE FROM {}", self.table.qualified_name())
    }
}

fn split_binds(set: AttributeMap) -> (Vec<BindType>, Vec<Value>) {
    set.into_iter().map(|(_, v)| (v.bind_type(), v)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> TableDescriptor {
        TableDescriptor::new("main", "blog", "id").unwrap()
    }

    fn columns() -> Vec<String> {
        ["id", "title", "body", "views"].iter().map(|s| s.to_string()).collect()
    }

    fn record_map() -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("id", 7);
        map.insert("title", "Hello");
        map.insert("not_a_column", "dropped");
        map.insert("views", 3);
        map.insert("body", Value::Null);
        map
    }

    fn stamp(mut map: AttributeMap) -> AttributeMap {
        map.insert("body", "stamped");
        map
    }

    #[test]
    fn test_insert_drops_unknown_keys_and_pk() {
        let table = blog();
        let filters = FilterPipeline::new();
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT).insert(record_map(), &columns());

        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "main"."blog" ("title", "views", "body") VALUES (?, ?, ?)"#
        );
        assert!(!stmt.sql.contains("not_a_column"));
        assert_eq!(stmt.type_codes(), "sis");
        assert_eq!(
            stmt.values,
            vec![Value::from("Hello"), Value::Integer(3), Value::Null]
        );
    }

    #[test]
    fn test_insert_keeps_pk_when_policy_allows() {
        let table = blog();
        let filters = FilterPipeline::new();
        let policy = WritePolicy {
            ignore_key_on_insert: false,
            ..WritePolicy::DEFAULT
        };
        let stmt = SqlBuilder::new(&table, &filters, policy).insert(record_map(), &columns());
        assert!(stmt.sql.starts_with(r#"INSERT INTO "main"."blog" ("id", "title""#));
        assert_eq!(stmt.values[0], Value::Integer(7));
    }

    #[test]
    fn test_insert_with_nothing_to_write_uses_default_values() {
        let table = blog();
        let filters = FilterPipeline::new();
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT)
            .insert([("id", Value::Null)].into_iter().collect(), &columns());
        assert_eq!(stmt.sql, r#"INSERT INTO "main"."blog" DEFAULT VALUES"#);
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn test_input_filters_run_before_narrowing() {
        let table = blog();
        let filters = FilterPipeline::new().input("stamp", stamp);
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT)
            .insert([("title", "t")].into_iter().collect(), &columns());
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "main"."blog" ("title", "body") VALUES (?, ?)"#
        );
        assert_eq!(stmt.values[1], Value::from("stamped"));
    }

    #[test]
    fn test_update_binds_key_last() {
        let table = blog();
        let filters = FilterPipeline::new();
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT)
            .update(record_map(), &columns(), &Value::Integer(7))
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"UPDATE "main"."blog" SET "title" = ?, "views" = ?, "body" = ? WHERE "id" = ?"#
        );
        assert_eq!(stmt.type_codes(), "sisi");
        assert_eq!(stmt.values.last(), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_update_with_empty_set_compiles_nothing() {
        let table = blog();
        let filters = FilterPipeline::new();
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT).update(
            [("id", 1)].into_iter().collect(),
            &columns(),
            &Value::Integer(1),
        );
        assert!(stmt.is_none());
    }

    #[test]
    fn test_delete_by_key() {
        let table = blog();
        let filters = FilterPipeline::new();
        let stmt = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT).delete(&Value::from("abc"));
        assert_eq!(stmt.sql, r#"DELETE FROM "main"."blog" WHERE "id" = ?"#);
        assert_eq!(stmt.type_codes(), "s");
    }

    #[test]
    fn test_select_by_field_predicates() {
        let table = blog();
        let filters = FilterPipeline::new();
        let builder = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT);

        assert_eq!(
            builder
                .select_by_field("title", &Value::from("Hel%"), Cardinality::Many)
                .unwrap(),
            r#"SELECT * FROM "main"."blog" WHERE "title" LIKE 'Hel%'"#
        );
        assert_eq!(
            builder
                .select_by_field("is_public", &Value::from(true), Cardinality::One)
                .unwrap(),
            r#"SELECT * FROM "main"."blog" WHERE "is_public" = '1' LIMIT 1"#
        );
        assert_eq!(
            builder
                .select_by_field("title", &Value::from("it's"), Cardinality::Many)
                .unwrap(),
            r#"SELECT * FROM "main"."blog" WHERE "title" = 'it''s'"#
        );
        assert!(
            builder
                .select_by_field("title; DROP TABLE blog", &Value::Null, Cardinality::Many)
                .is_err()
        );
    }

    #[test]
    fn test_select_by_key_literal() {
        let table = blog();
        let filters = FilterPipeline::new();
        let builder = SqlBuilder::new(&table, &filters, WritePolicy::DEFAULT);
        assert_eq!(
            builder.select_by_key(&Value::Integer(5)),
            r#"SELECT * FROM "main"."blog" WHERE "id" = 5"#
        );
        assert_eq!(
            builder.select_all(Some("views > 2")),
            r#"SELECT * FROM "main"."blog" WHERE views > 2"#
        );
        assert_eq!(builder.truncate(), r#"DELETE FROM "main"."blog""#);
    }
}
