//! Per-type configuration surface for records.
//!
//! A record type is any type implementing [`Entity`]. The trait carries the
//! table binding (table name, primary key, database override), the write
//! policy, the ordered filter registration and the lifecycle hooks. All of
//! it is resolved once, when a [`Repository`](crate::Repository) is created.

use crate::filter::FilterPipeline;
use crate::record::Record;
use crate::sql::WritePolicy;

/// A record type bound to one table.
///
/// Only [`NAME`](Self::NAME) is required; the table defaults to its
/// lowercase form and the primary key to `id`.
///
/// # Examples
///
/// ```
/// use simple_orm_core::{AttributeMap, Entity, FilterPipeline, Value};
///
/// struct Blog;
///
/// fn trim_title(mut map: AttributeMap) -> AttributeMap {
///     if let Some(Value::Text(t)) = map.get("title").cloned() {
///         map.insert("title", t.trim());
///     }
///     map
/// }
///
/// impl Entity for Blog {
///     const NAME: &'static str = "Blog";
///
///     fn filters() -> FilterPipeline {
///         FilterPipeline::new().input("trim_title", trim_title)
///     }
/// }
///
/// assert_eq!(Blog::table_name(), "blog");
/// assert_eq!(Blog::PRIMARY_KEY, "id");
/// ```
pub trait Entity: Sized + 'static {
    /// Type name, used in diagnostics and as the default table name.
    const NAME: &'static str;

    /// Explicit table name; defaults to `NAME` lowercased.
    const TABLE: Option<&'static str> = None;

    /// Primary-key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Database override; defaults to the session's database.
    const DATABASE: Option<&'static str> = None;

    /// Whether the primary key is written on insert and update.
    const WRITE_POLICY: WritePolicy = WritePolicy::DEFAULT;

    /// Resolved table name.
    fn table_name() -> String {
        Self::TABLE
            .map(str::to_string)
            .unwrap_or_else(|| Self::NAME.to_lowercase())
    }

    /// Ordered input and output filters for this type.
    fn filters() -> FilterPipeline {
        FilterPipeline::new()
    }

    /// Runs once after construction and hydration complete.
    fn initialise(_record: &mut Record<Self>) {}

    /// Runs before the insert snapshot of the attribute map is taken.
    fn pre_insert(_record: &mut Record<Self>) {}

    /// Runs after a successful insert and re-hydration.
    fn post_insert(_record: &mut Record<Self>) {}

    /// Display text for a record, used by option lists.
    fn label(record: &Record<Self>) -> String {
        record.id().to_string()
    }
}
