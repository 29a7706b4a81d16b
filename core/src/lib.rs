//! Core contracts for the rowkit persistence layer.
//!
//! This crate defines the pieces an application shares with the SQLite
//! storage crate:
//!
//! - [`FromRow`] — the explicit row materializer implemented by every type
//!   a query can return, including read-only projections.
//! - [`Entity`] — the full persistence contract (table name, identity
//!   column, mutable identity, row serialization) required by mutation
//!   operations.
//! - [`RowValues`] — the ordered column/value pairs an entity serializes
//!   into for inserts and updates.
//! - [`SchemaObject`] / [`SchemaSet`] — the schema registry: every table
//!   and index the database lifecycle manager creates on first open.
//!
//! # Example
//!
//! ```
//! use rowkit_core::{Entity, FromRow, RowValues, SchemaObject, SchemaSet};
//!
//! struct Emp {
//!     id: Option<i64>,
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! impl FromRow for Emp {
//!     fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
//!         Ok(Self {
//!             id: row.get("_id")?,
//!             first_name: row.get("first_name")?,
//!             last_name: row.get("last_name")?,
//!         })
//!     }
//! }
//!
//! impl Entity for Emp {
//!     fn table_name() -> &'static str {
//!         "emp"
//!     }
//!
//!     fn id(&self) -> Option<i64> {
//!         self.id
//!     }
//!
//!     fn set_id(&mut self, id: i64) {
//!         self.id = Some(id);
//!     }
//!
//!     fn to_row(&self) -> RowValues {
//!         RowValues::new()
//!             .with("first_name", self.first_name.clone())
//!             .with("last_name", self.last_name.clone())
//!     }
//! }
//!
//! let schema = SchemaSet::new().with(SchemaObject::table(
//!     "emp",
//!     "CREATE TABLE IF NOT EXISTS emp (
//!         _id INTEGER PRIMARY KEY AUTOINCREMENT,
//!         first_name TEXT NOT NULL,
//!         last_name TEXT NOT NULL
//!     );",
//! ));
//! assert!(schema.validate().is_ok());
//! ```

mod entity;
mod row;
mod schema;

pub use entity::{Entity, FromRow, ID_COLUMN};
pub use row::RowValues;
pub use schema::{InvalidIdentifier, ObjectKind, SchemaObject, SchemaSet, validate_identifier};
