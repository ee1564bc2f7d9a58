//! Per-field change history for values assigned through the mutation API.
//!
//! Only [`Record::set`](crate::Record::set) feeds the log. Hydration,
//! output filters, raw writes and inserts never touch it, and a successful
//! update clears it.

use serde::Serialize;

use crate::value::Value;

/// Pending change(s) recorded for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Modification {
    /// The field was changed once.
    Single(Value),
    /// The field was changed more than once; values in assignment order.
    History(Vec<Value>),
}

impl Modification {
    /// All recorded values in assignment order.
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::History(vs) => vs,
        }
    }

    /// The most recently assigned value.
    pub fn latest(&self) -> &Value {
        match self {
            Self::Single(v) => v,
            Self::History(vs) => vs.last().unwrap_or(&Value::Null),
        }
    }
}

/// Ordered log of field modifications since the last successful update.
///
/// # Examples
///
/// ```
/// use simple_orm_core::{Modification, ModificationLog, Value};
///
/// let mut log = ModificationLog::default();
/// log.record("title", Value::from("a"));
/// log.record("title", Value::from("b"));
///
/// assert_eq!(
///     log.get("title"),
///     Some(&Modification::History(vec!["a".into(), "b".into()]))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModificationLog {
    fields: Vec<(String, Modification)>,
}

impl ModificationLog {
    /// Appends `value` to the history of `field`.
    ///
    /// The first change is stored as [`Modification::Single`]; the second
    /// converts the entry into a [`Modification::History`] list.
    pub fn record(&mut self, field: &str, value: Value) {
        match self.fields.iter_mut().find(|(k, _)| k == field) {
            None => self
                .fields
                .push((field.to_string(), Modification::Single(value))),
            Some((_, entry)) => match entry {
                Modification::History(values) => values.push(value),
                Modification::Single(previous) => {
                    let previous = std::mem::take(previous);
                    *entry = Modification::History(vec![previous, value]);
                }
            },
        }
    }

    pub fn get(&self, field: &str) -> Option<&Modification> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, m)| m)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Modification)> {
        self.fields.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_change_is_not_a_list() {
        let mut log = ModificationLog::default();
        log.record("body", Value::from("x"));
        assert_eq!(log.get("body"), Some(&Modification::Single("x".into())));
        assert_eq!(log.get("body").unwrap().values(), &[Value::from("x")]);
    }

    #[test]
    fn test_history_extends_in_order() {
        let mut log = ModificationLog::default();
        log.record("f", Value::Integer(1));
        log.record("f", Value::Integer(2));
        log.record("f", Value::Integer(1));
        let entry = log.get("f").unwrap();
        assert_eq!(
            entry.values(),
            &[Value::Integer(1), Value::Integer(2), Value::Integer(1)]
        );
        assert_eq!(entry.latest(), &Value::Integer(1));
    }

    #[test]
    fn test_null_first_change_still_counts_as_entry() {
        let mut log = ModificationLog::default();
        log.record("f", Value::Null);
        log.record("f", Value::Integer(2));
        assert_eq!(
            log.get("f"),
            Some(&Modification::History(vec![Value::Null, Value::Integer(2)]))
        );
    }

    #[test]
    fn test_fields_keep_first_change_order() {
        let mut log = ModificationLog::default();
        log.record("b", Value::Null);
        log.record("a", Value::Null);
        log.record("b", Value::Integer(1));
        assert_eq!(log.fields().collect::<Vec<_>>(), ["b", "a"]);
        log.clear();
        assert!(log.is_empty());
    }
}
