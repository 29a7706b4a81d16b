//! SQLite storage layer for the rowkit entity contract.
//!
//! This crate wraps a single SQLite connection behind a small, synchronous
//! persistence layer: a database lifecycle manager that owns schema
//! creation and upgrades, and a generic CRUD helper that materializes
//! typed entities from rows.
//!
//! # Architecture
//!
//! The crate is organized into four modules:
//!
//! - **`config`** — YAML-loadable store configuration
//! - **`database`** — lifecycle operations (open/create/upgrade/close) and
//!   read/write handle accessors
//! - **`crud`** — generic query and mutation operations over the entity
//!   contract
//! - **`error`** — the unified error taxonomy
//!
//! # Quick start
//!
//! ```no_run
//! use rowkit_core::{SchemaObject, SchemaSet};
//! use rowkit_sqlite::{Crud, Database, StoreConfig};
//!
//! let schema = SchemaSet::new().with(SchemaObject::table(
//!     "emp",
//!     "CREATE TABLE IF NOT EXISTS emp (
//!         _id INTEGER PRIMARY KEY AUTOINCREMENT,
//!         first_name TEXT NOT NULL,
//!         last_name TEXT NOT NULL
//!     );",
//! ));
//!
//! let mut db = Database::new(StoreConfig::at("app.db"), schema);
//! db.open().unwrap();
//!
//! let crud = Crud::new(&db);
//! assert!(!crud.exists("emp", Some("last_name = 'Lee'")).unwrap());
//!
//! db.close();
//! ```
//!
//! # Concurrency model
//!
//! Every operation blocks the calling thread until SQLite completes; there
//! are no background workers and no async suspension points. The helper
//! opens no transactions of its own — each DML call is its own implicit
//! unit of work, and whatever locking SQLite natively provides is the only
//! serialization in play. Callers sharing a store across threads must
//! synchronize externally; in particular the custom-key upsert's
//! update-then-insert fallback is not atomic.
//!
//! # Failure model
//!
//! Fail fast and loud: every failure surfaces as a descriptive
//! [`StoreError`], nothing is retried or recovered internally, and error
//! values embed the offending SQL or table name. Reporting is the caller's
//! responsibility.

mod config;
mod crud;
mod database;
mod error;

pub use config::{ConfigError, StoreConfig};
pub use crud::{Crud, UpsertOutcome};
pub use database::{Database, SchemaUpgrade};
pub use error::{Result, StoreError};
