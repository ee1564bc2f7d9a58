//! Convention-based "retrieve by field" resolution.
//!
//! A call named `retrieveBy<Name>` maps to a field lookup on `<name>`
//! converted from camel case to snake case: `retrieveByIsPublic` becomes a
//! lookup on `is_public`. Resolution happens on explicit request only,
//! through [`ConventionDispatcher::resolve`] or
//! [`Repository::dispatch`](crate::Repository::dispatch), for call names
//! that arrive as data. Compile-time wrappers come from [`finders!`](crate::finders).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{OrmError, Result};

/// Camel-case call prefix.
pub const RETRIEVE_BY_PREFIX: &str = "retrieveBy";

/// Snake-case call prefix.
pub const RETRIEVE_BY_SNAKE_PREFIX: &str = "retrieve_by_";

/// Converts a camel-case name to a lowercase, underscore-separated field.
///
/// A boundary is inserted before every uppercase letter that does not
/// start a word.
///
/// # Examples
///
/// ```
/// use simple_orm_core::field_name_from_camel;
///
/// assert_eq!(field_name_from_camel("IsPublic"), "is_public");
/// assert_eq!(field_name_from_camel("Title"), "title");
/// ```
pub fn field_name_from_camel(name: &str) -> String {
    static BOUNDARY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\B([A-Z])").expect("static regex must compile"));
    BOUNDARY_RE.replace_all(name, "_${1}").to_lowercase()
}

/// Resolves convention call names to field names.
#[derive(Debug, Clone, Copy)]
pub struct ConventionDispatcher {
    entity: &'static str,
}

impl ConventionDispatcher {
    pub fn new(entity: &'static str) -> Self {
        Self { entity }
    }

    /// Resolves `method` to the field it looks up.
    ///
    /// Accepts `retrieveBy<Name>` and `retrieve_by_<field>`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Dispatch`] for any other name, including a bare
    /// prefix with no field.
    ///
    /// # Examples
    ///
    /// ```
    /// use simple_orm_core::ConventionDispatcher;
    ///
    /// let dispatcher = ConventionDispatcher::new("Blog");
    /// assert_eq!(dispatcher.resolve("retrieveByIsPublic").unwrap(), "is_public");
    /// assert_eq!(dispatcher.resolve("retrieve_by_title").unwrap(), "title");
    /// assert!(dispatcher.resolve("deleteEverything").is_err());
    /// ```
    pub fn resolve(&self, method: &str) -> Result<String> {
        if let Some(name) = method.strip_prefix(RETRIEVE_BY_PREFIX) {
            if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                return Ok(field_name_from_camel(name));
            }
        } else if let Some(field) = method.strip_prefix(RETRIEVE_BY_SNAKE_PREFIX) {
            if !field.is_empty() {
                return Ok(field.to_string());
            }
        }

        Err(OrmError::Dispatch {
            entity: self.entity,
            method: method.to_string(),
        })
    }
}

/// Generates per-field lookup functions on a record type.
///
/// Each generated function delegates to
/// [`Repository::retrieve_by_field`](crate::Repository::retrieve_by_field).
///
/// # Examples
///
/// ```
/// use simple_orm_core::{Entity, finders};
///
/// pub struct Blog;
///
/// impl Entity for Blog {
///     const NAME: &'static str = "Blog";
/// }
///
/// finders!(Blog {
///     retrieve_by_title => title,
///     retrieve_by_is_public => is_public,
/// });
/// ```
#[macro_export]
macro_rules! finders {
    ($entity:ty { $($method:ident => $field:ident),* $(,)? }) => {
        impl $entity {
            $(
                pub fn $method(
                    repository: &$crate::Repository<'_, $entity>,
                    value: impl Into<$crate::Value>,
                    cardinality: $crate::Cardinality,
                ) -> $crate::Result<$crate::Fetched<$entity>> {
                    repository.retrieve_by_field(stringify!($field), value, cardinality)
                }
            )*
        }
    };
}
