//! Ordered field-to-value mapping holding a record's in-memory state.
//!
//! Iteration order is insertion order, which is also the column order of
//! generated `INSERT` and `UPDATE` statements. Overwriting an existing key
//! keeps its original position.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{OrmError, Result};
use crate::value::Value;

/// Ordered mapping from column name to [`Value`].
///
/// # Examples
///
/// ```
/// use simple_orm_core::{AttributeMap, Value};
///
/// let mut map = AttributeMap::new();
/// map.insert("title", "Hello");
/// map.insert("body", "World!");
/// map.insert("title", "Hi");
///
/// let keys: Vec<_> = map.keys().collect();
/// assert_eq!(keys, ["title", "body"]);
/// assert_eq!(map.get("title"), Some(&Value::from("Hi")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: Vec<(String, Value)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builds a map from a JSON object of scalar values.
    ///
    /// Booleans become integers (`1`/`0`). Keys keep the object's order.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Validation`] if `json` is not an object, or if
    /// any member is an array or a nested object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(object) = json else {
            return Err(OrmError::Validation(
                "the data given must be a mapping of field names to values".into(),
            ));
        };

        let mut map = Self::with_capacity(object.len());
        for (key, value) in object {
            let value = match value {
                serde_json::Value::Null => Value::Null,
                serde_json::Value::Bool(b) => Value::from(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::Integer(i),
                    None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                serde_json::Value::String(s) => Value::Text(s),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(OrmError::Validation(format!(
                        "field \"{key}\" must hold a scalar value"
                    )));
                }
            };
            map.insert(key, value);
        }
        Ok(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Keeps only the keys that appear in `columns`.
    pub fn retain_columns(&mut self, columns: &[String]) {
        self.entries.retain(|(k, _)| columns.iter().any(|c| c == k));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for AttributeMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for AttributeMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
