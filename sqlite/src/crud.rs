//! Generic CRUD operations over the entity contract.
//!
//! [`Crud`] is the operational layer: typed list and single-row retrieval,
//! scalar queries, existence checks, and insert/update/upsert/delete. It
//! borrows the [`Database`] lifecycle manager for its handles and issues
//! plain SQL strings with positional parameters — no query builder beyond
//! simple string assembly.
//!
//! Every operation blocks the calling thread until SQLite completes, and
//! every DML call is its own implicit unit of work; the helper opens no
//! transactions of its own. Concurrent callers must synchronize externally.
//!
//! The convenience forms that accept a where clause splice it into the SQL
//! text verbatim. Untrusted input belongs in the parameterized SQL-string
//! forms, never in a where clause.

use rowkit_core::{Entity, FromRow, validate_identifier};
use rusqlite::types::Value;
use rusqlite::{Params, ToSql};
use tracing::trace;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Which path an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was inserted; carries the identity it received.
    Inserted(i64),
    /// Existing rows were updated; carries the affected-row count.
    Updated(usize),
}

/// CRUD operations for entity types, on top of a [`Database`].
///
/// # Examples
///
/// ```no_run
/// use rowkit_core::{Entity, FromRow, RowValues, SchemaObject, SchemaSet};
/// use rowkit_sqlite::{Crud, Database, StoreConfig};
///
/// struct Emp {
///     id: Option<i64>,
///     first_name: String,
///     last_name: String,
/// }
/// # impl FromRow for Emp {
/// #     fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
/// #         Ok(Self {
/// #             id: row.get("_id")?,
/// #             first_name: row.get("first_name")?,
/// #             last_name: row.get("last_name")?,
/// #         })
/// #     }
/// # }
/// # impl Entity for Emp {
/// #     fn table_name() -> &'static str { "emp" }
/// #     fn id(&self) -> Option<i64> { self.id }
/// #     fn set_id(&mut self, id: i64) { self.id = Some(id); }
/// #     fn to_row(&self) -> RowValues {
/// #         RowValues::new()
/// #             .with("first_name", self.first_name.clone())
/// #             .with("last_name", self.last_name.clone())
/// #     }
/// # }
///
/// let schema = SchemaSet::new().with(SchemaObject::table(
///     "emp",
///     "CREATE TABLE IF NOT EXISTS emp (
///         _id INTEGER PRIMARY KEY AUTOINCREMENT,
///         first_name TEXT NOT NULL,
///         last_name TEXT NOT NULL
///     );",
/// ));
/// let mut db = Database::new(StoreConfig::at("app.db"), schema);
/// db.open().unwrap();
///
/// let crud = Crud::new(&db);
/// let mut ann = Emp { id: None, first_name: "Ann".into(), last_name: "Lee".into() };
/// let id = crud.insert(&mut ann, true).unwrap();
///
/// let found: Option<Emp> = crud.retrieve_by_id(id, true).unwrap();
/// assert!(found.is_some());
/// ```
pub struct Crud<'a> {
    db: &'a Database,
}

impl<'a> Crud<'a> {
    /// Creates a CRUD helper borrowing the given database manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Query operations
    // ------------------------------------------------------------------

    /// Executes a read query and materializes one `T` per result row.
    ///
    /// Result-row order is preserved. Zero rows yield an empty `Vec`,
    /// never an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Query`] if the SQL is invalid or the engine
    /// rejects the statement.
    pub fn retrieve_list<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<T>> {
        let conn = self.db.read()?;
        trace!(sql, "retrieve_list");
        let mut stmt = conn.prepare(sql).map_err(|e| query_error(sql, e))?;
        let rows = stmt
            .query_map(params, |row| T::from_row(row))
            .map_err(|e| query_error(sql, e))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| query_error(sql, e))?);
        }
        Ok(items)
    }

    /// Convenience form of [`retrieve_list`](Self::retrieve_list) building
    /// `SELECT * FROM {table} [WHERE ..] [ORDER BY ..]` for the entity's
    /// table.
    pub fn retrieve_from<T: Entity>(
        &self,
        where_clause: Option<&str>,
        order_by: Option<&str>,
    ) -> Result<Vec<T>> {
        validate_identifier(T::table_name())?;
        let mut sql = format!("SELECT * FROM {}", T::table_name());
        if let Some(clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        if let Some(order) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        self.retrieve_list(&sql, [])
    }

    /// Executes a query expected to match exactly 0 or 1 rows.
    ///
    /// # Errors
    ///
    /// Zero rows return `Ok(None)`, or [`StoreError::NotFound`] when
    /// `required`. Two or more rows always fail with
    /// [`StoreError::Integrity`], regardless of `required`.
    pub fn retrieve_one<T: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<T>> {
        let mut items = self.retrieve_list::<T, P>(sql, params)?;
        match items.len() {
            0 if required => Err(StoreError::NotFound {
                context: sql.to_string(),
            }),
            0 => Ok(None),
            1 => Ok(items.pop()),
            _ => Err(StoreError::Integrity {
                context: sql.to_string(),
            }),
        }
    }

    /// Retrieves a single entity by identity value.
    pub fn retrieve_by_id<T: Entity>(&self, id: i64, required: bool) -> Result<Option<T>> {
        validate_identifier(T::table_name())?;
        validate_identifier(T::id_column())?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            T::table_name(),
            T::id_column()
        );
        self.retrieve_one(&sql, [id], required)
    }

    /// Retrieves a single entity by an arbitrary where clause.
    pub fn retrieve_one_where<T: Entity>(
        &self,
        where_clause: &str,
        required: bool,
    ) -> Result<Option<T>> {
        validate_identifier(T::table_name())?;
        let sql = format!("SELECT * FROM {} WHERE {}", T::table_name(), where_clause);
        self.retrieve_one(&sql, [], required)
    }

    // ------------------------------------------------------------------
    // Scalar queries
    // ------------------------------------------------------------------

    /// Executes a scalar query and reads the result as text.
    ///
    /// Integer and real scalars are rendered to their text form, matching
    /// SQLite's own column-text coercion. A NULL scalar counts as no value.
    pub fn query_for_string<P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<String>> {
        match self.scalar_value(sql, params, required)? {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text)),
            Some(Value::Integer(n)) => Ok(Some(n.to_string())),
            Some(Value::Real(r)) => Ok(Some(r.to_string())),
            Some(Value::Blob(_)) => Err(StoreError::Format {
                value: "<blob>".to_string(),
                target: "text",
            }),
            Some(Value::Null) => Ok(None),
        }
    }

    /// Executes a scalar query and reads the result as an integer.
    ///
    /// Text scalars holding an integer literal are accepted; real and blob
    /// scalars fail with [`StoreError::Format`].
    pub fn query_for_long<P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<i64>> {
        match self.scalar_value(sql, params, required)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(n)) => Ok(Some(n)),
            Some(Value::Text(text)) => match text.trim().parse::<i64>() {
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(StoreError::Format {
                    value: text,
                    target: "integer",
                }),
            },
            Some(Value::Real(r)) => Err(StoreError::Format {
                value: r.to_string(),
                target: "integer",
            }),
            Some(Value::Blob(_)) => Err(StoreError::Format {
                value: "<blob>".to_string(),
                target: "integer",
            }),
        }
    }

    /// Executes a scalar query and converts the textual result to a float.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Format`] if the scalar is not numeric.
    pub fn query_for_double<P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<f64>> {
        match self.query_for_string(sql, params, required)? {
            None => Ok(None),
            Some(text) => match text.trim().parse::<f64>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(StoreError::Format {
                    value: text,
                    target: "double",
                }),
            },
        }
    }

    /// Executes a scalar query and reads the integer result as a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Format`] unless the stored integer is exactly
    /// 0 or 1.
    pub fn query_for_bool<P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<bool>> {
        match self.query_for_long(sql, params, required)? {
            None => Ok(None),
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            Some(other) => Err(StoreError::Format {
                value: other.to_string(),
                target: "boolean (expected 0 or 1)",
            }),
        }
    }

    /// Whether any row of `table` matches the optional where clause.
    ///
    /// Never fails for "not found" — only for malformed SQL or an invalid
    /// table name.
    pub fn exists(&self, table: &str, where_clause: Option<&str>) -> Result<bool> {
        validate_identifier(table)?;
        let mut sql = format!("SELECT COUNT(1) FROM {table}");
        if let Some(clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }
        let count = self.query_for_long(&sql, [], true)?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Reads the first row's first column, or `None` when the query
    /// matches no row (or the scalar is NULL) and `required` is unset.
    fn scalar_value<P: Params>(
        &self,
        sql: &str,
        params: P,
        required: bool,
    ) -> Result<Option<Value>> {
        let conn = self.db.read()?;
        trace!(sql, "scalar query");
        let mut stmt = conn.prepare(sql).map_err(|e| query_error(sql, e))?;
        let mut rows = stmt.query(params).map_err(|e| query_error(sql, e))?;

        let value = match rows.next().map_err(|e| query_error(sql, e))? {
            None => None,
            Some(row) => match row.get::<_, Value>(0).map_err(|e| query_error(sql, e))? {
                Value::Null => None,
                value => Some(value),
            },
        };

        if value.is_none() && required {
            return Err(StoreError::NotFound {
                context: sql.to_string(),
            });
        }
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Mutation operations
    // ------------------------------------------------------------------

    /// Inserts the entity as one new row.
    ///
    /// With `auto_increment_id`, the entity must not yet carry an identity;
    /// the generated rowid is assigned back onto it and returned. Without,
    /// the entity's existing identity is written as an explicit column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Precondition`] before touching storage when an
    /// auto-increment insert is given an entity with a non-null identity,
    /// when an explicit-identity insert is given one without, or when
    /// `to_row()` includes the identity column. Storage-level rejection
    /// fails with [`StoreError::Write`].
    pub fn insert<T: Entity>(&self, entity: &mut T, auto_increment_id: bool) -> Result<i64> {
        let table = T::table_name();
        validate_identifier(table)?;
        validate_identifier(T::id_column())?;

        if auto_increment_id {
            if let Some(id) = entity.id() {
                return Err(StoreError::Precondition(format!(
                    "insert into {table}: entity already has identity {id}; \
                     auto-increment insert requires a null identity"
                )));
            }
        }

        let row = entity.to_row();
        if row.contains(T::id_column()) {
            return Err(StoreError::Precondition(format!(
                "insert into {table}: to_row() must not include the identity column '{}'",
                T::id_column()
            )));
        }

        let explicit_id = if auto_increment_id {
            None
        } else {
            Some(entity.id().ok_or_else(|| {
                StoreError::Precondition(format!(
                    "insert into {table}: explicit-identity insert requires an identity"
                ))
            })?)
        };

        let mut columns: Vec<&str> = Vec::with_capacity(row.len() + 1);
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(row.len() + 1);
        if let Some(ref id) = explicit_id {
            columns.push(T::id_column());
            values.push(id);
        }
        for (column, value) in row.pairs() {
            validate_identifier(column)?;
            columns.push(column);
            values.push(value);
        }
        if columns.is_empty() {
            return Err(StoreError::Precondition(format!(
                "insert into {table}: to_row() produced no columns"
            )));
        }

        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );
        trace!(sql, "insert");

        let conn = self.db.write()?;
        conn.execute(&sql, &values[..])
            .map_err(|e| write_error(table, e))?;

        match explicit_id {
            Some(id) => Ok(id),
            None => {
                let id = conn.last_insert_rowid();
                if id == 0 {
                    return Err(StoreError::Write {
                        table: table.to_string(),
                        reason: "no identity returned for inserted row".to_string(),
                    });
                }
                entity.set_id(id);
                Ok(id)
            }
        }
    }

    /// Updates rows with the entity's serialized fields.
    ///
    /// The default filter (no where clause) is identity equality, which
    /// requires the entity to carry an identity. Returns the affected-row
    /// count — 0 when nothing matched, which is not an error.
    pub fn update<T: Entity>(&self, entity: &T, where_clause: Option<&str>) -> Result<usize> {
        let table = T::table_name();
        validate_identifier(table)?;
        validate_identifier(T::id_column())?;

        let row = entity.to_row();
        if row.contains(T::id_column()) {
            return Err(StoreError::Precondition(format!(
                "update on {table}: to_row() must not include the identity column '{}'",
                T::id_column()
            )));
        }
        if row.is_empty() {
            return Err(StoreError::Precondition(format!(
                "update on {table}: to_row() produced no columns"
            )));
        }

        let mut assignments = Vec::with_capacity(row.len());
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(row.len() + 1);
        for (i, (column, value)) in row.pairs().iter().enumerate() {
            validate_identifier(column)?;
            assignments.push(format!("{column} = ?{}", i + 1));
            values.push(value);
        }

        let id_value;
        let sql = match where_clause {
            Some(clause) => format!(
                "UPDATE {table} SET {} WHERE {clause}",
                assignments.join(", ")
            ),
            None => {
                let id = entity.id().ok_or_else(|| {
                    StoreError::Precondition(format!(
                        "update on {table}: entity has no identity and no where clause was given"
                    ))
                })?;
                id_value = id;
                values.push(&id_value);
                format!(
                    "UPDATE {table} SET {} WHERE {} = ?{}",
                    assignments.join(", "),
                    T::id_column(),
                    values.len()
                )
            }
        };
        trace!(sql, "update");

        let conn = self.db.write()?;
        conn.execute(&sql, &values[..])
            .map_err(|e| write_error(table, e))
    }

    /// Identity-based upsert: update when the entity carries an identity,
    /// insert otherwise.
    pub fn upsert<T: Entity>(&self, entity: &mut T) -> Result<UpsertOutcome> {
        if entity.id().is_some() {
            self.update(entity, None).map(UpsertOutcome::Updated)
        } else {
            self.insert(entity, true).map(UpsertOutcome::Inserted)
        }
    }

    /// Custom-key upsert: update first, insert only when zero rows were
    /// affected.
    ///
    /// Zero rows affected is the only signal that no matching row exists,
    /// which is why the two-step order matters. The two steps are not one
    /// atomic unit: two callers racing on the same missing key can both
    /// fall through to the insert.
    pub fn upsert_where<T: Entity>(
        &self,
        entity: &mut T,
        where_clause: &str,
    ) -> Result<UpsertOutcome> {
        let affected = self.update(entity, Some(where_clause))?;
        if affected > 0 {
            return Ok(UpsertOutcome::Updated(affected));
        }
        let auto = entity.id().is_none();
        self.insert(entity, auto).map(UpsertOutcome::Inserted)
    }

    /// Deletes the entity's row by identity equality.
    ///
    /// Returns the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Precondition`] if the entity carries no
    /// identity.
    pub fn delete<T: Entity>(&self, entity: &T) -> Result<usize> {
        let table = T::table_name();
        validate_identifier(table)?;
        validate_identifier(T::id_column())?;

        let id = entity.id().ok_or_else(|| {
            StoreError::Precondition(format!("delete from {table}: entity has no identity"))
        })?;

        let sql = format!("DELETE FROM {table} WHERE {} = ?1", T::id_column());
        trace!(sql, "delete");

        let conn = self.db.write()?;
        conn.execute(&sql, [id]).map_err(|e| write_error(table, e))
    }
}

fn query_error(sql: &str, source: rusqlite::Error) -> StoreError {
    StoreError::Query {
        sql: sql.to_string(),
        source,
    }
}

fn write_error(table: &str, source: rusqlite::Error) -> StoreError {
    StoreError::Write {
        table: table.to_string(),
        reason: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use rowkit_core::{RowValues, SchemaObject, SchemaSet};

    struct Emp {
        id: Option<i64>,
        first_name: String,
        last_name: String,
    }

    impl Emp {
        fn new(first_name: &str, last_name: &str) -> Self {
            Self {
                id: None,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            }
        }
    }

    impl FromRow for Emp {
        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            Ok(Self {
                id: row.get("_id")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
            })
        }
    }

    impl Entity for Emp {
        fn table_name() -> &'static str {
            "emp"
        }

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }

        fn to_row(&self) -> RowValues {
            RowValues::new()
                .with("first_name", self.first_name.clone())
                .with("last_name", self.last_name.clone())
        }
    }

    fn open_db() -> Database {
        let schema = SchemaSet::new().with(SchemaObject::table(
            "emp",
            "CREATE TABLE IF NOT EXISTS emp (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL
            );",
        ));
        let mut db = Database::new(StoreConfig::in_memory(), schema);
        db.open().unwrap();
        db
    }

    #[test]
    fn test_retrieve_list_on_empty_table_is_empty() {
        let db = open_db();
        let crud = Crud::new(&db);
        let all: Vec<Emp> = crud.retrieve_from(None, None).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_retrieve_list_rejects_malformed_sql() {
        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.retrieve_list::<Emp, _>("SELEC * FROM emp", []);
        assert!(matches!(result, Err(StoreError::Query { .. })));
    }

    #[test]
    fn test_retrieve_one_required_fails_on_zero_rows() {
        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.retrieve_by_id::<Emp>(42, true);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_retrieve_one_not_required_returns_none() {
        let db = open_db();
        let crud = Crud::new(&db);
        let found = crud.retrieve_by_id::<Emp>(42, false).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_retrieve_one_fails_on_ambiguous_result_even_when_not_required() {
        let db = open_db();
        let crud = Crud::new(&db);
        crud.insert(&mut Emp::new("Ann", "Lee"), true).unwrap();
        crud.insert(&mut Emp::new("Ben", "Lee"), true).unwrap();

        for required in [true, false] {
            let result = crud.retrieve_one_where::<Emp>("last_name = 'Lee'", required);
            assert!(matches!(result, Err(StoreError::Integrity { .. })));
        }
    }

    #[test]
    fn test_insert_with_existing_identity_fails_before_storage() {
        let db = open_db();
        let crud = Crud::new(&db);
        let mut ann = Emp::new("Ann", "Lee");
        ann.id = Some(7);

        let result = crud.insert(&mut ann, true);
        assert!(matches!(result, Err(StoreError::Precondition(_))));
        assert!(!crud.exists("emp", None).unwrap());
    }

    #[test]
    fn test_leaked_identity_column_in_row_fails() {
        struct Leaky;

        impl FromRow for Leaky {
            fn from_row(_row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
                Ok(Self)
            }
        }

        impl Entity for Leaky {
            fn table_name() -> &'static str {
                "emp"
            }

            fn id(&self) -> Option<i64> {
                None
            }

            fn set_id(&mut self, _id: i64) {}

            fn to_row(&self) -> RowValues {
                RowValues::new()
                    .with("_id", 1i64)
                    .with("first_name", "Ann".to_string())
            }
        }

        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.insert(&mut Leaky, true);
        assert!(matches!(result, Err(StoreError::Precondition(_))));
    }

    #[test]
    fn test_query_for_bool_rejects_non_boolean_integer() {
        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.query_for_bool("SELECT 625", [], true);
        match result {
            Err(StoreError::Format { value, .. }) => assert_eq!(value, "625"),
            other => panic!("expected Format error, got {other:?}"),
        }
    }

    #[test]
    fn test_query_for_double_rejects_non_numeric_text() {
        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.query_for_double("SELECT 'abc'", [], true);
        assert!(matches!(result, Err(StoreError::Format { .. })));
    }

    #[test]
    fn test_scalar_not_required_returns_none_on_zero_rows() {
        let db = open_db();
        let crud = Crud::new(&db);
        let value = crud
            .query_for_string("SELECT first_name FROM emp WHERE _id = 42", [], false)
            .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_exists_rejects_invalid_table_name() {
        let db = open_db();
        let crud = Crud::new(&db);
        let result = crud.exists("emp; DROP TABLE emp", None);
        assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
    }
}
