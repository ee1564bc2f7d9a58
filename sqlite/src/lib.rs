//! SQLite backend for `simple-orm-core`.
//!
//! [`SqliteConnection`] implements the core
//! [`Connection`](simple_orm_core::Connection) capability on `rusqlite`
//! with bundled SQLite, and [`ConnectionConfig`] opens a ready
//! [`Session`](simple_orm_core::Session) from YAML.
//!
//! # Quick start
//!
//! ```
//! use simple_orm_core::{Cardinality, Entity, Session};
//! use simple_orm_sqlite::SqliteConnection;
//!
//! struct Blog;
//!
//! impl Entity for Blog {
//!     const NAME: &'static str = "Blog";
//! }
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! conn.execute_batch(
//!     "CREATE TABLE blog (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, body TEXT);",
//! )
//! .unwrap();
//!
//! let session = Session::use_connection(conn, "main").unwrap();
//! let blogs = session.repository::<Blog>().unwrap();
//!
//! let mut entry = blogs
//!     .create([("title", "Hello"), ("body", "World!")].into_iter().collect())
//!     .unwrap();
//! entry.set("body", "Mars!");
//! blogs.update(&mut entry).unwrap();
//!
//! let found = blogs
//!     .retrieve_by_field("title", "Hello", Cardinality::One)
//!     .unwrap()
//!     .into_one()
//!     .unwrap();
//! assert_eq!(found.get("body").unwrap().to_string(), "Mars!");
//! ```

mod config;
mod connection;
mod error;

pub use config::{ConnectionConfig, MEMORY_PATH};
pub use connection::SqliteConnection;
pub use error::{Result, SqliteError};
