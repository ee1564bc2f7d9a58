//! Scalar column values and bind-type inference.
//!
//! A [`Value`] is what a record holds per column: an integer, a
//! floating-point number, a string, or null. Equality is strict on both
//! type and value, so `Integer(0)`, `Float(0.0)` and `Text("0")` are three
//! distinct values for dirty tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar column value.
///
/// # Examples
///
/// ```
/// use simple_orm_core::Value;
///
/// assert_eq!(Value::from(42), Value::Integer(42));
/// assert_eq!(Value::from("hi"), Value::Text("hi".into()));
/// assert_eq!(Value::from(true), Value::Integer(1));
/// assert_ne!(Value::from(1), Value::from("1"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL` (the default).
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 text.
    Text(String),
}

/// Parameter type used when binding a value to a prepared statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindType {
    Integer,
    Float,
    /// Fallback for text and null.
    Text,
}

impl BindType {
    /// Single-letter code, matching the classic `i`/`d`/`s` binding format.
    pub fn code(self) -> char {
        match self {
            Self::Integer => 'i',
            Self::Float => 'd',
            Self::Text => 's',
        }
    }
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Infers the bind type for this value. Null falls back to text.
    pub fn bind_type(&self) -> BindType {
        match self {
            Self::Integer(_) => BindType::Integer,
            Self::Float(_) => BindType::Float,
            Self::Text(_) | Self::Null => BindType::Text,
        }
    }

    /// Returns the value as an integer when it holds one, or text that parses as one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether `self` and `other` hold the same value of the same type.
    ///
    /// Floats compare by bit pattern, so `NaN` is identical to itself.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    /// Renders the value as a SQL literal, quoting and escaping text.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => quote_literal(s),
        }
    }
}

/// Wraps `s` in single quotes, doubling any embedded quote.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
