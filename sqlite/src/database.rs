//! Database lifecycle management.
//!
//! [`Database`] owns the single physical SQLite connection. It creates the
//! application's schema objects on first open, runs version upgrades through
//! a caller-supplied [`SchemaUpgrade`], and hands out read- and
//! write-oriented handle accessors to the CRUD helper.
//!
//! Schema state is tracked in `PRAGMA user_version`: a fresh database is
//! created and stamped with the configured version; an older stored version
//! triggers the registered upgrader; a newer one is refused.
//!
//! # Example
//!
//! ```no_run
//! use rowkit_core::{SchemaObject, SchemaSet};
//! use rowkit_sqlite::{Database, StoreConfig};
//!
//! let schema = SchemaSet::new().with(SchemaObject::table(
//!     "emp",
//!     "CREATE TABLE IF NOT EXISTS emp (_id INTEGER PRIMARY KEY AUTOINCREMENT, last_name TEXT);",
//! ));
//!
//! let mut db = Database::new(StoreConfig::at("app.db"), schema);
//! db.open().unwrap();
//! let handle = db.read().unwrap();
//! # let _ = handle;
//! ```

use std::cmp::Ordering;

use rowkit_core::SchemaSet;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Migration steps between schema versions. Contract only — the library
/// provides no default implementation; concrete applications supply one.
pub trait SchemaUpgrade {
    /// Brings the schema from `old_version` up to `new_version`.
    ///
    /// Runs before the lifecycle manager stamps the new version, on the
    /// open connection. A returned error aborts the open.
    fn upgrade(&self, conn: &Connection, old_version: u32, new_version: u32) -> Result<()>;
}

/// Owns the physical database connection and its schema lifecycle.
///
/// Constructed closed; [`open`](Self::open) is idempotent and
/// [`close`](Self::close) is safe to call even if the database was never
/// opened. The read- and write-oriented accessors currently return the same
/// underlying handle.
pub struct Database {
    config: StoreConfig,
    schema: SchemaSet,
    upgrader: Option<Box<dyn SchemaUpgrade>>,
    conn: Option<Connection>,
}

impl Database {
    /// Creates a closed database manager for the given configuration and
    /// schema registry.
    pub fn new(config: StoreConfig, schema: SchemaSet) -> Self {
        Self {
            config,
            schema,
            upgrader: None,
            conn: None,
        }
    }

    /// Registers the migration implementation invoked when the stored
    /// schema version is older than the configured one.
    pub fn with_upgrader(mut self, upgrader: Box<dyn SchemaUpgrade>) -> Self {
        self.upgrader = Some(upgrader);
        self
    }

    /// Opens the connection and reconciles schema state. Idempotent: a
    /// second call on an open database is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the underlying storage cannot
    /// be opened, [`StoreError::Schema`] on DDL or upgrade failure, and
    /// [`StoreError::InvalidIdentifier`] if the schema registry carries a
    /// malformed object name.
    pub fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            debug!("database already open");
            return Ok(());
        }

        self.schema.validate()?;

        let conn = match &self.config.path {
            Some(path) => Connection::open(path).map_err(|e| {
                StoreError::Connection(format!(
                    "cannot open database at '{}': {e}",
                    path.display()
                ))
            })?,
            None => Connection::open_in_memory()
                .map_err(|e| StoreError::Connection(format!("cannot open in-memory database: {e}")))?,
        };

        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;\n PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))
        .map_err(|e| StoreError::Connection(format!("cannot configure connection: {e}")))?;

        self.reconcile_schema(&conn)?;

        self.conn = Some(conn);
        Ok(())
    }

    /// Whether the database is currently open.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The read-oriented handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the database is not open.
    pub fn read(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| StoreError::Connection("database is not open".to_string()))
    }

    /// The write-oriented handle. Currently returns the same handle as
    /// [`read`](Self::read).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the database is not open.
    pub fn write(&self) -> Result<&Connection> {
        self.read()
    }

    /// Releases the handle. Safe to call when never opened, and idempotent.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "error while closing database");
            } else {
                debug!("database closed");
            }
        }
    }

    /// Brings the stored schema in line with the configured version.
    fn reconcile_schema(&self, conn: &Connection) -> Result<()> {
        let target = self.config.schema_version;

        if self.config.debug_recreate_schema_on_open {
            info!(version = target, "debug recreate: dropping and recreating schema");
            self.drop_schema_objects(conn)?;
            self.create_schema_objects(conn)?;
            set_user_version(conn, target)?;
            return Ok(());
        }

        let stored = user_version(conn)?;
        if stored == 0 {
            info!(version = target, "creating schema objects");
            self.create_schema_objects(conn)?;
            set_user_version(conn, target)?;
            return Ok(());
        }

        match stored.cmp(&target) {
            Ordering::Equal => {
                debug!(version = stored, "schema up to date");
                Ok(())
            }
            Ordering::Less => {
                let upgrader = self.upgrader.as_ref().ok_or_else(|| {
                    StoreError::Schema(format!(
                        "upgrade from schema version {stored} to {target} required but no upgrader is registered"
                    ))
                })?;
                info!(from = stored, to = target, "upgrading schema");
                upgrader.upgrade(conn, stored, target)?;
                set_user_version(conn, target)?;
                Ok(())
            }
            Ordering::Greater => Err(StoreError::Schema(format!(
                "stored schema version {stored} is newer than configured version {target}"
            ))),
        }
    }

    /// Issues the registry's DDL, one object at a time. There is no
    /// enclosing transaction and no rollback: a partial failure is fatal
    /// and surfaces the offending object to the caller.
    fn create_schema_objects(&self, conn: &Connection) -> Result<()> {
        for object in self.schema.objects() {
            conn.execute_batch(object.create_sql()).map_err(|e| {
                StoreError::Schema(format!(
                    "creating {} '{}' failed: {e}",
                    object.kind(),
                    object.name()
                ))
            })?;
        }
        Ok(())
    }

    /// Drops every registered object in reverse creation order.
    fn drop_schema_objects(&self, conn: &Connection) -> Result<()> {
        for object in self.schema.drop_order() {
            conn.execute_batch(&object.drop_sql()).map_err(|e| {
                StoreError::Schema(format!(
                    "dropping {} '{}' failed: {e}",
                    object.kind(),
                    object.name()
                ))
            })?;
        }
        Ok(())
    }
}

fn user_version(conn: &Connection) -> Result<u32> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StoreError::Schema(format!("cannot read user_version: {e}")))?;
    Ok(version as u32)
}

fn set_user_version(conn: &Connection, version: u32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)
        .map_err(|e| StoreError::Schema(format!("cannot set user_version to {version}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowkit_core::SchemaObject;

    fn emp_schema() -> SchemaSet {
        SchemaSet::new().with(SchemaObject::table(
            "emp",
            "CREATE TABLE IF NOT EXISTS emp (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL
            );",
        ))
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut db = Database::new(StoreConfig::in_memory(), emp_schema());
        db.open().unwrap();
        db.open().unwrap();
        assert!(db.is_open());
    }

    #[test]
    fn test_close_without_open_is_safe() {
        let mut db = Database::new(StoreConfig::in_memory(), emp_schema());
        db.close();
        db.close();
        assert!(!db.is_open());
    }

    #[test]
    fn test_handles_unavailable_when_closed() {
        let db = Database::new(StoreConfig::in_memory(), emp_schema());
        assert!(matches!(db.read(), Err(StoreError::Connection(_))));
        assert!(matches!(db.write(), Err(StoreError::Connection(_))));
    }

    #[test]
    fn test_open_stamps_configured_version() {
        let mut db = Database::new(
            StoreConfig::in_memory().with_schema_version(3),
            emp_schema(),
        );
        db.open().unwrap();
        let version = user_version(db.read().unwrap()).unwrap();
        assert_eq!(version, 3);
    }

    #[test]
    fn test_open_enables_foreign_keys() {
        let mut db = Database::new(StoreConfig::in_memory(), emp_schema());
        db.open().unwrap();
        let fk: i32 = db
            .read()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_open_rejects_invalid_schema_object_name() {
        let schema = SchemaSet::new().with(SchemaObject::table("bad name", "CREATE TABLE x (y);"));
        let mut db = Database::new(StoreConfig::in_memory(), schema);
        assert!(matches!(
            db.open(),
            Err(StoreError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_open_surfaces_ddl_failure() {
        let schema = SchemaSet::new().with(SchemaObject::table("emp", "CREATE TABL emp (x);"));
        let mut db = Database::new(StoreConfig::in_memory(), schema);
        match db.open() {
            Err(StoreError::Schema(msg)) => assert!(msg.contains("emp")),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    struct AddMiddleName;

    impl SchemaUpgrade for AddMiddleName {
        fn upgrade(&self, conn: &Connection, old_version: u32, new_version: u32) -> Result<()> {
            assert_eq!((old_version, new_version), (1, 2));
            conn.execute_batch("ALTER TABLE emp ADD COLUMN middle_name TEXT;")
                .map_err(|e| StoreError::Schema(format!("upgrade failed: {e}")))
        }
    }

    #[test]
    fn test_reopen_at_higher_version_without_upgrader_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let mut db = Database::new(StoreConfig::at(&path), emp_schema());
        db.open().unwrap();
        db.close();

        let mut db = Database::new(
            StoreConfig::at(&path).with_schema_version(2),
            emp_schema(),
        );
        assert!(matches!(db.open(), Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_reopen_at_higher_version_runs_upgrader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let mut db = Database::new(StoreConfig::at(&path), emp_schema());
        db.open().unwrap();
        db.close();

        let mut db = Database::new(
            StoreConfig::at(&path).with_schema_version(2),
            emp_schema(),
        )
        .with_upgrader(Box::new(AddMiddleName));
        db.open().unwrap();

        let columns: i64 = db
            .read()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('emp') WHERE name = 'middle_name'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(columns, 1);
        assert_eq!(user_version(db.read().unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_reopen_at_older_version_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let mut db = Database::new(
            StoreConfig::at(&path).with_schema_version(5),
            emp_schema(),
        );
        db.open().unwrap();
        db.close();

        let mut db = Database::new(
            StoreConfig::at(&path).with_schema_version(2),
            emp_schema(),
        );
        assert!(matches!(db.open(), Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_debug_recreate_discards_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let config = StoreConfig {
            path: Some(path.clone()),
            debug_recreate_schema_on_open: true,
            ..StoreConfig::default()
        };

        let mut db = Database::new(config.clone(), emp_schema());
        db.open().unwrap();
        db.read()
            .unwrap()
            .execute(
                "INSERT INTO emp (first_name, last_name) VALUES ('Ann', 'Lee')",
                [],
            )
            .unwrap();
        db.close();

        let mut db = Database::new(config, emp_schema());
        db.open().unwrap();
        let count: i64 = db
            .read()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM emp", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
