//! Column introspection for bound tables.
//!
//! By default every call re-queries storage. An optional cache keyed by
//! `(database, table)` can be enabled per session; it is only ever
//! invalidated by hand.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::connection::Connection;
use crate::descriptor::TableDescriptor;
use crate::error::{OrmError, Result};

type CacheKey = (String, String);

/// Resolves the ordered column list of a table.
#[derive(Debug, Default)]
pub struct SchemaIntrospector {
    cache: Option<RefCell<HashMap<CacheKey, Vec<String>>>>,
}

impl SchemaIntrospector {
    /// Introspector that queries storage on every call.
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    /// Introspector that remembers column lists until invalidated.
    pub fn cached() -> Self {
        Self {
            cache: Some(RefCell::new(HashMap::new())),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Returns the column names of `table`, in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Schema`] if the driver cannot describe the table.
    pub fn columns(&self, conn: &dyn Connection, table: &TableDescriptor) -> Result<Vec<String>> {
        let key = (table.database().to_string(), table.table().to_string());

        if let Some(cache) = &self.cache {
            if let Some(columns) = cache.borrow().get(&key) {
                debug!(table = table.table(), "schema cache hit");
                return Ok(columns.clone());
            }
            debug!(table = table.table(), "schema cache miss");
        }

        let columns = conn
            .describe(table.database(), table.table())
            .map_err(|source| OrmError::Schema {
                table: format!("{}.{}", table.database(), table.table()),
                source,
            })?;

        if let Some(cache) = &self.cache {
            cache.borrow_mut().insert(key, columns.clone());
        }
        Ok(columns)
    }

    /// Drops the cached column list of `table`, if any.
    pub fn invalidate(&self, table: &TableDescriptor) {
        if let Some(cache) = &self.cache {
            cache
                .borrow_mut()
                .remove(&(table.database().to_string(), table.table().to_string()));
        }
    }

    /// Drops every cached column list.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.borrow_mut().clear();
        }
    }
}
