//! Record lifecycle and persistence engine for a minimal table-bound ORM.
//!
//! Each record type implements [`Entity`] and is bound to one table. A
//! [`Session`] owns the driver [`Connection`]; a [`Repository`] built from
//! it constructs, persists and queries [`Record`]s of one type:
//!
//! - Loading: by primary key, from an attribute map, from a map plus an
//!   immediate insert, or as an empty unsaved record ([`LoadStrategy`]).
//! - Filtering: output filters shape loaded data, input filters shape data
//!   about to be written ([`FilterPipeline`]).
//! - Change tracking: [`Record::set`] appends to a per-field
//!   [`ModificationLog`] that a successful update clears.
//! - SQL: statements are assembled by [`SqlBuilder`], narrowed to the
//!   table's real columns as reported by the [`SchemaIntrospector`].
//! - Conventions: `retrieveBy<Field>` call names resolve to field lookups
//!   through [`ConventionDispatcher`] or the [`finders!`] macro.
//!
//! The crate is driver-agnostic. `simple-orm-sqlite` provides a SQLite
//! [`Connection`].
//!
//! # Example
//!
//! ```ignore
//! use simple_orm_core::*;
//!
//! struct Blog;
//!
//! impl Entity for Blog {
//!     const NAME: &'static str = "Blog";
//! }
//!
//! let session = Session::use_connection(conn, "main")?;
//! let blogs = session.repository::<Blog>()?;
//!
//! let mut entry = blogs.create([("title", "Hello"), ("body", "World!")].into_iter().collect())?;
//! entry.set("body", "Mars!");
//! blogs.update(&mut entry)?;
//! assert!(entry.is_modified().is_none());
//! ```

mod attributes;
mod connection;
mod convention;
mod descriptor;
mod dirty;
mod entity;
mod error;
mod filter;
mod record;
mod repository;
mod schema;
mod session;
mod sql;
mod value;

#[cfg(test)]
mod testing;

pub use attributes::AttributeMap;
pub use connection::{Connection, ExecOutcome, RowSet, Statement};
pub use convention::{
    ConventionDispatcher, RETRIEVE_BY_PREFIX, RETRIEVE_BY_SNAKE_PREFIX, field_name_from_camel,
};
pub use descriptor::TableDescriptor;
pub use dirty::{Modification, ModificationLog};
pub use entity::Entity;
pub use error::{DriverError, OrmError, Result};
pub use filter::{FilterPipeline, InputFilter, OutputFilter};
pub use record::{LoadData, LoadStrategy, Record};
pub use repository::{Fetched, Repository};
pub use schema::SchemaIntrospector;
pub use session::Session;
pub use sql::{Cardinality, CompiledStatement, SqlBuilder, WritePolicy};
pub use value::{BindType, Value};
