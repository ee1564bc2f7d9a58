//! Record lifecycle and query gateway for one record type.
//!
//! A [`Repository`] binds an [`Entity`] to a [`Session`]. It is the only
//! place records are constructed (one of the four [`LoadStrategy`]s),
//! persisted (insert, update, delete) and queried.
//!
//! # Loading
//!
//! | Strategy | Storage round-trip | Output filters | `is_new` |
//! |---|---|---|---|
//! | [`retrieve_by_pk`](Repository::retrieve_by_pk) | row by primary key | yes | no |
//! | [`hydrate`](Repository::hydrate) | none | yes | no |
//! | [`create`](Repository::create) | insert + re-read | yes | no |
//! | [`empty`](Repository::empty) | column list only | no | yes |
//!
//! Every strategy ends by running [`Entity::initialise`] exactly once.
//!
//! # Failure semantics
//!
//! A failed insert, update or delete leaves the record's new/persisted
//! flag and its modification log exactly as they were.

use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::attributes::AttributeMap;
use crate::connection::ExecOutcome;
use crate::convention::ConventionDispatcher;
use crate::descriptor::TableDescriptor;
use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::filter::FilterPipeline;
use crate::record::{LoadData, LoadStrategy, Record};
use crate::session::Session;
use crate::sql::{Cardinality, CompiledStatement, SqlBuilder, WritePolicy};
use crate::value::Value;

/// Result of a query, shaped by the requested [`Cardinality`].
pub enum Fetched<E: Entity> {
    /// No rows were requested.
    None,
    /// The first row, if any.
    One(Option<Record<E>>),
    /// Every row.
    Many(Vec<Record<E>>),
}

impl<E: Entity> std::fmt::Debug for Fetched<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::One(record) => f.debug_tuple("One").field(record).finish(),
            Self::Many(records) => f.debug_tuple("Many").field(records).finish(),
        }
    }
}

impl<E: Entity> Fetched<E> {
    /// The single record, or the first of many.
    pub fn into_one(self) -> Option<Record<E>> {
        match self {
            Self::None => None,
            Self::One(record) => record,
            Self::Many(records) => records.into_iter().next(),
        }
    }

    /// All fetched records.
    pub fn into_many(self) -> Vec<Record<E>> {
        match self {
            Self::None => Vec::new(),
            Self::One(record) => record.into_iter().collect(),
            Self::Many(records) => records,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None | Self::One(None) => true,
            Self::One(Some(_)) => false,
            Self::Many(records) => records.is_empty(),
        }
    }
}

/// Record type `E` bound to a session.
///
/// # Examples
///
/// ```ignore
/// let blogs = session.repository::<Blog>()?;
///
/// let mut entry = blogs.create([("title", "Hello"), ("body", "World!")].into_iter().collect())?;
/// entry.set("body", "Mars!");
/// blogs.save(&mut entry)?;
///
/// let same = blogs.retrieve_by_field("title", "Hello", Cardinality::One)?.into_one();
/// blogs.delete(&entry)?;
/// ```
pub struct Repository<'s, E: Entity> {
    session: &'s Session,
    table: TableDescriptor,
    filters: FilterPipeline,
    policy: WritePolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity> Repository<'s, E> {
    pub(crate) fn new(session: &'s Session) -> Result<Self> {
        let database = E::DATABASE.unwrap_or(session.database());
        let table = TableDescriptor::new(database, E::table_name(), E::PRIMARY_KEY)?;
        Ok(Self {
            session,
            table,
            filters: E::filters(),
            policy: E::WRITE_POLICY,
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn filters(&self) -> &FilterPipeline {
        &self.filters
    }

    /// Column names of the bound table.
    pub fn columns(&self) -> Result<Vec<String>> {
        self.session
            .schema()
            .columns(self.session.connection(), &self.table)
    }

    fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(&self.table, &self.filters, self.policy)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Loads the row whose primary key equals `pk`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if `pk` is not an integer (or
    /// integer text), and [`OrmError::NotFound`] if no row matches.
    pub fn retrieve_by_pk(&self, pk: impl Into<Value>) -> Result<Record<E>> {
        let pk = pk.into();
        let Some(key) = pk.as_i64() else {
            return Err(OrmError::Validation(format!(
                "the primary key must be an integer, got '{pk}'"
            )));
        };

        let mut record = Record::new(LoadStrategy::ByPrimaryKey, LoadData::PrimaryKey(pk));
        record.write(E::PRIMARY_KEY, key);
        self.hydrate_from_database(&mut record)?;
        E::initialise(&mut record);
        Ok(record)
    }

    /// Builds a record from `data` without touching storage.
    ///
    /// Entries are written as given, unknown keys included; output filters
    /// then run. The record counts as persisted.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if any field name is empty.
    pub fn hydrate(&self, data: AttributeMap) -> Result<Record<E>> {
        let mut record = self.load_by_map(LoadStrategy::ByAttributeMap, data)?;
        E::initialise(&mut record);
        Ok(record)
    }

    /// Like [`hydrate`](Self::hydrate), from a JSON object of scalars.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if `json` is not such an object.
    pub fn hydrate_json(&self, json: serde_json::Value) -> Result<Record<E>> {
        self.hydrate(AttributeMap::from_json(json)?)
    }

    /// Builds a record from `data` and inserts it immediately.
    pub fn create(&self, data: AttributeMap) -> Result<Record<E>> {
        let mut record = self.load_by_map(LoadStrategy::NewFromAttributes, data)?;
        self.insert(&mut record)?;
        E::initialise(&mut record);
        Ok(record)
    }

    /// Builds an unsaved record with every column set to null.
    pub fn empty(&self) -> Result<Record<E>> {
        let columns = self.columns()?;
        let mut record = Record::new(LoadStrategy::Empty, LoadData::None);
        for column in columns {
            record.write(&column, Value::Null);
        }
        record.mark_new();
        E::initialise(&mut record);
        Ok(record)
    }

    fn load_by_map(&self, strategy: LoadStrategy, data: AttributeMap) -> Result<Record<E>> {
        if data.keys().any(str::is_empty) {
            return Err(OrmError::Validation(
                "field names must be non-empty strings".into(),
            ));
        }

        let mut record = Record::new(strategy, LoadData::Attributes(data.clone()));
        for (field, value) in data {
            record.write(&field, value);
        }
        self.filters.apply_output(record.attributes_mut());
        Ok(record)
    }

    /// Re-reads the record's row and overwrites its attributes in place.
    ///
    /// The modification log is left untouched.
    pub fn reload_in_place(&self, record: &mut Record<E>) -> Result<()> {
        self.hydrate_from_database(record)
    }

    /// Returns a freshly reloaded copy, leaving `record` unchanged.
    pub fn reloaded_copy(&self, record: &Record<E>) -> Result<Record<E>> {
        let mut copy = record.clone();
        self.hydrate_from_database(&mut copy)?;
        Ok(copy)
    }

    fn hydrate_from_database(&self, record: &mut Record<E>) -> Result<()> {
        let key = record.id().clone();
        let sql = self.builder().select_by_key(&key);
        let row = self
            .fetch_rows(&sql, Some(1))?
            .into_iter()
            .next()
            .ok_or_else(|| OrmError::NotFound {
                entity: E::NAME,
                pk: key.to_string(),
            })?;

        let attributes = record.attributes_mut();
        for (column, value) in row {
            attributes.insert(column, value);
        }
        self.filters.apply_output(attributes);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Inserts a new record or updates a persisted one.
    pub fn save(&self, record: &mut Record<E>) -> Result<()> {
        if record.is_new() {
            self.insert(record)
        } else {
            self.update(record)
        }
    }

    fn insert(&self, record: &mut Record<E>) -> Result<()> {
        E::pre_insert(record);

        // A caller-supplied key is authoritative; only a key left to storage
        // is taken from the generated one.
        let key_supplied = !self.policy.ignore_key_on_insert && !record.id().is_null();
        let columns = self.columns()?;
        let stmt = self.builder().insert(record.get_all().clone(), &columns);
        let outcome = self.execute(&stmt)?;

        if let Some(key) = outcome.generated_key.filter(|k| *k != 0 && !key_supplied) {
            record.write(E::PRIMARY_KEY, key);
        }
        record.mark_persisted();
        info!(table = self.table.table(), pk = %record.id(), "record inserted");

        self.hydrate_from_database(record)?;
        E::post_insert(record);
        Ok(())
    }

    /// Writes the record's current attributes to its row.
    ///
    /// The modification log is cleared once the statement succeeds. When no
    /// column survives narrowing, no statement is issued.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::State`] if the record was never persisted.
    pub fn update(&self, record: &mut Record<E>) -> Result<()> {
        if record.is_new() {
            return Err(OrmError::State {
                operation: "update",
            });
        }

        let key = record.id().clone();
        let columns = self.columns()?;
        match self.builder().update(record.get_all().clone(), &columns, &key) {
            Some(stmt) => {
                self.execute(&stmt)?;
                info!(table = self.table.table(), pk = %key, "record updated");
            }
            None => warn!(table = self.table.table(), pk = %key, "nothing to update"),
        }

        record.clear_modifications();
        Ok(())
    }

    /// Deletes the record's row.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::State`] if the record was never persisted.
    pub fn delete(&self, record: &Record<E>) -> Result<()> {
        if record.is_new() {
            return Err(OrmError::State {
                operation: "delete",
            });
        }

        let stmt = self.builder().delete(record.id());
        self.execute(&stmt)?;
        info!(table = self.table.table(), pk = %record.id(), "record deleted");
        Ok(())
    }

    fn execute(&self, stmt: &CompiledStatement) -> Result<ExecOutcome> {
        debug!(sql = %stmt.sql, types = %stmt.type_codes(), "executing statement");
        let conn = self.session.connection();

        let mut prepared = conn
            .prepare(&stmt.sql)
            .map_err(|e| OrmError::preparation(&stmt.sql, e))?;
        prepared
            .bind_typed(&stmt.types, &stmt.values)
            .map_err(|e| OrmError::execution(&stmt.sql, e))?;
        prepared
            .execute()
            .map_err(|e| OrmError::execution(&stmt.sql, e))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn fetch_rows(&self, sql: &str, limit: Option<usize>) -> Result<Vec<AttributeMap>> {
        debug!(sql = %sql, "executing query");
        let mut rows = self
            .session
            .connection()
            .query(sql)
            .map_err(|e| OrmError::execution(sql, e))?;

        let mut out = Vec::new();
        while limit.is_none_or(|n| out.len() < n) {
            match rows.next_row().map_err(|e| OrmError::execution(sql, e))? {
                Some(row) => out.push(row),
                None => break,
            }
        }
        rows.close();
        Ok(out)
    }

    /// Runs a literal SQL statement and hydrates the resulting rows.
    ///
    /// `:database`, `:table` and `:pk` are replaced with the bound table's
    /// names first. Rows become records via [`hydrate`](Self::hydrate).
    pub fn sql(&self, sql: &str, cardinality: Cardinality) -> Result<Fetched<E>> {
        let sql = self.table.expand_placeholders(sql);
        match cardinality {
            Cardinality::None => {
                self.fetch_rows(&sql, Some(0))?;
                Ok(Fetched::None)
            }
            Cardinality::One => {
                let row = self.fetch_rows(&sql, Some(1))?.into_iter().next();
                Ok(Fetched::One(row.map(|r| self.hydrate(r)).transpose()?))
            }
            Cardinality::Many => {
                let records = self
                    .fetch_rows(&sql, None)?
                    .into_iter()
                    .map(|r| self.hydrate(r))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Fetched::Many(records))
            }
        }
    }

    /// Runs a counting statement and returns its first column.
    ///
    /// A missing, non-numeric or non-positive result counts as zero.
    pub fn count(&self, sql: &str) -> Result<i64> {
        let sql = self.table.expand_placeholders(sql);
        let first = self
            .fetch_rows(&sql, Some(1))?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().map(|(_, v)| v));

        let count = match first {
            Some(Value::Float(f)) => f as i64,
            Some(v) => v.as_i64().unwrap_or(0),
            None => 0,
        };
        Ok(count.max(0))
    }

    /// Every row of the table.
    pub fn all(&self) -> Result<Vec<Record<E>>> {
        let sql = self.builder().select_all(None);
        Ok(self.sql(&sql, Cardinality::Many)?.into_many())
    }

    /// Removes every row of the table.
    pub fn truncate(&self) -> Result<()> {
        let sql = self.builder().truncate();
        self.sql(&sql, Cardinality::None)?;
        info!(table = self.table.table(), "table truncated");
        Ok(())
    }

    /// Records whose `field` matches `value`.
    ///
    /// Uses `LIKE` when the value contains `%`, equality otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if `field` is not a plain identifier.
    pub fn retrieve_by_field(
        &self,
        field: &str,
        value: impl Into<Value>,
        cardinality: Cardinality,
    ) -> Result<Fetched<E>> {
        let sql = self
            .builder()
            .select_by_field(field, &value.into(), cardinality)?;
        self.sql(&sql, cardinality)
    }

    /// Resolves a convention call such as `retrieveByIsPublic` and runs it.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Dispatch`] if `method` is not a recognized
    /// convention call.
    pub fn dispatch(
        &self,
        method: &str,
        value: impl Into<Value>,
        cardinality: Cardinality,
    ) -> Result<Fetched<E>> {
        let field = ConventionDispatcher::new(E::NAME).resolve(method)?;
        self.retrieve_by_field(&field, value, cardinality)
    }

    /// Primary key and [`Entity::label`] of each matching record, for
    /// populating select boxes.
    pub fn option_labels(&self, where_clause: Option<&str>) -> Result<Vec<(Value, String)>> {
        let sql = self.builder().select_all(where_clause);
        Ok(self
            .sql(&sql, Cardinality::Many)?
            .into_many()
            .into_iter()
            .map(|record| (record.id().clone(), E::label(&record)))
            .collect())
    }
}

impl<E: Entity> std::fmt::Debug for Repository<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &E::NAME)
            .field("table", &self.table)
            .field("filters", &self.filters)
            .field("policy", &self.policy)
            .finish()
    }
}
