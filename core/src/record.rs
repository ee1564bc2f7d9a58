//! In-memory record state.
//!
//! A [`Record`] holds the attribute map, the modification log, the load
//! strategy it was built with and its new/persisted flag. Records are
//! created and persisted through a [`Repository`](crate::Repository); this
//! module only covers state that needs no storage round-trip.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::attributes::AttributeMap;
use crate::dirty::ModificationLog;
use crate::entity::Entity;
use crate::value::Value;

static NULL: Value = Value::Null;

/// How a record was initialised. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Fetched from storage by primary key.
    ByPrimaryKey,
    /// Hydrated from a supplied map, without a storage round-trip.
    ByAttributeMap,
    /// Hydrated from a supplied map, then inserted.
    NewFromAttributes,
    /// Every column set to null; not yet persisted.
    Empty,
}

/// Raw data a record was constructed from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadData {
    None,
    PrimaryKey(Value),
    Attributes(AttributeMap),
}

type ParentRef = Weak<dyn Any + Send + Sync>;

/// An entity instance bound to one table row.
pub struct Record<E: Entity> {
    attributes: AttributeMap,
    modifications: ModificationLog,
    strategy: LoadStrategy,
    load_data: LoadData,
    is_new: bool,
    parent: Option<ParentRef>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Record<E> {
    pub(crate) fn new(strategy: LoadStrategy, load_data: LoadData) -> Self {
        Self {
            attributes: AttributeMap::new(),
            modifications: ModificationLog::default(),
            strategy,
            load_data,
            is_new: false,
            parent: None,
            _entity: PhantomData,
        }
    }

    /// Primary-key value, or null if unset.
    pub fn id(&self) -> &Value {
        self.attributes.get(E::PRIMARY_KEY).unwrap_or(&NULL)
    }

    /// Value of a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// The full attribute map.
    pub fn get_all(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Assigns `value` to `field`, recording the change if it differs.
    ///
    /// Values are compared by type and value: `Integer(1)` replacing
    /// `Text("1")` counts as a change.
    ///
    /// # Examples
    ///
    /// ```
    /// use simple_orm_core::{Entity, Modification, Record};
    /// # struct Blog;
    /// # impl Entity for Blog { const NAME: &'static str = "Blog"; }
    /// # fn demo(record: &mut Record<Blog>) {
    /// record.set("title", "a").set("title", "b");
    /// let log = record.is_modified().unwrap();
    /// assert_eq!(
    ///     log.get("title"),
    ///     Some(&Modification::History(vec!["a".into(), "b".into()]))
    /// );
    /// # }
    /// ```
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let current = self.attributes.get(field).unwrap_or(&NULL);
        if !current.is_identical(&value) {
            self.modifications.record(field, value.clone());
        }
        self.attributes.insert(field, value);
        self
    }

    /// Writes `value` to `field` without touching the modification log.
    pub fn write(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(field, value);
        self
    }

    /// The modification log, or `None` if nothing changed.
    pub fn is_modified(&self) -> Option<&ModificationLog> {
        (!self.modifications.is_empty()).then_some(&self.modifications)
    }

    /// Whether this record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn load_strategy(&self) -> LoadStrategy {
        self.strategy
    }

    pub fn load_data(&self) -> &LoadData {
        &self.load_data
    }

    /// Links this record to its owning record. The link is never followed
    /// by persistence operations and does not keep the parent alive.
    pub fn set_parent<P: Any + Send + Sync>(&mut self, parent: &Arc<P>) {
        let weak: ParentRef = Arc::downgrade(parent) as ParentRef;
        self.parent = Some(weak);
    }

    /// The owning record, if set and still alive.
    pub fn parent(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.parent.as_ref()?.upgrade()
    }

    /// The owning record downcast to `P`.
    pub fn parent_as<P: Any + Send + Sync>(&self) -> Option<Arc<P>> {
        self.parent()?.downcast::<P>().ok()
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    pub(crate) fn mark_new(&mut self) {
        self.is_new = true;
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.is_new = false;
    }

    pub(crate) fn clear_modifications(&mut self) {
        self.modifications.clear();
    }
}

impl<E: Entity> Clone for Record<E> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            modifications: self.modifications.clone(),
            strategy: self.strategy,
            load_data: self.load_data.clone(),
            is_new: self.is_new,
            parent: self.parent.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Record<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(E::NAME)
            .field("attributes", &self.attributes)
            .field("modifications", &self.modifications)
            .field("strategy", &self.strategy)
            .field("is_new", &self.is_new)
            .finish_non_exhaustive()
    }
}
