//! The schema registry: named DDL objects and identifier validation.
//!
//! Applications declare every table and index once, as a [`SchemaObject`]
//! carrying its `CREATE` statement, and hand the resulting [`SchemaSet`] to
//! the database lifecycle manager. Creation order is preserved; drops are
//! emitted in reverse order so dependent objects go first.
//!
//! Identifier validation guards every table and column name that gets
//! spliced into SQL text. Names must contain only alphanumeric characters
//! and underscores.

use std::fmt;

use thiserror::Error;

/// A table or column name containing characters outside `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier '{0}': must contain only alphanumeric characters and underscores")]
pub struct InvalidIdentifier(pub String);

/// Validates that an identifier contains only alphanumeric characters and
/// underscores.
///
/// # Errors
///
/// Returns [`InvalidIdentifier`] if the name is empty or contains any other
/// character.
pub fn validate_identifier(name: &str) -> Result<(), InvalidIdentifier> {
    if name.is_empty() {
        return Err(InvalidIdentifier(name.to_string()));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// The kind of a schema object, which determines its `DROP` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A `CREATE TABLE` object.
    Table,
    /// A `CREATE INDEX` object.
    Index,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => f.write_str("table"),
            Self::Index => f.write_str("index"),
        }
    }
}

/// One named DDL object: a table or index plus the statement that creates it.
///
/// Write the `CREATE` statement with `IF NOT EXISTS` so a fresh open can
/// re-run it safely.
#[derive(Debug, Clone)]
pub struct SchemaObject {
    name: String,
    kind: ObjectKind,
    create_sql: String,
}

impl SchemaObject {
    /// Declares a table.
    pub fn table(name: impl Into<String>, create_sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Table,
            create_sql: create_sql.into(),
        }
    }

    /// Declares an index.
    pub fn index(name: impl Into<String>, create_sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Index,
            create_sql: create_sql.into(),
        }
    }

    /// The object's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object's kind.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The `CREATE` statement as declared.
    pub fn create_sql(&self) -> &str {
        &self.create_sql
    }

    /// The generated `DROP ... IF EXISTS` statement.
    pub fn drop_sql(&self) -> String {
        match self.kind {
            ObjectKind::Table => format!("DROP TABLE IF EXISTS {};", self.name),
            ObjectKind::Index => format!("DROP INDEX IF EXISTS {};", self.name),
        }
    }
}

/// The ordered collection of schema objects an application declares.
///
/// # Examples
///
/// ```
/// use rowkit_core::{SchemaObject, SchemaSet};
///
/// let schema = SchemaSet::new()
///     .with(SchemaObject::table(
///         "emp",
///         "CREATE TABLE IF NOT EXISTS emp (_id INTEGER PRIMARY KEY AUTOINCREMENT, last_name TEXT);",
///     ))
///     .with(SchemaObject::index(
///         "idx_emp_last_name",
///         "CREATE INDEX IF NOT EXISTS idx_emp_last_name ON emp(last_name);",
///     ));
/// assert_eq!(schema.objects().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    objects: Vec<SchemaObject>,
}

impl SchemaSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an object, consuming and returning `self` for builder-style
    /// construction.
    pub fn with(mut self, object: SchemaObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Appends an object.
    pub fn push(&mut self, object: SchemaObject) {
        self.objects.push(object);
    }

    /// The objects in creation order.
    pub fn objects(&self) -> &[SchemaObject] {
        &self.objects
    }

    /// The objects in drop order (reverse of creation order, so dependent
    /// objects are dropped first).
    pub fn drop_order(&self) -> impl Iterator<Item = &SchemaObject> {
        self.objects.iter().rev()
    }

    /// Validates every object name.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdentifier`] for the first offending name.
    pub fn validate(&self) -> Result<(), InvalidIdentifier> {
        for object in &self.objects {
            validate_identifier(&object.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("emp").is_ok());
        assert!(validate_identifier("_id").is_ok());
        assert!(validate_identifier("table123").is_ok());
        assert!(validate_identifier("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_identifier_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_invalid_identifier_special_chars() {
        assert!(validate_identifier("emp; DROP TABLE emp").is_err());
        assert!(validate_identifier("drop;--").is_err());
        assert!(validate_identifier("hello world").is_err());
        assert!(validate_identifier("emp-log").is_err());
    }

    #[test]
    fn test_drop_sql_matches_kind() {
        let table = SchemaObject::table("emp", "CREATE TABLE emp (x);");
        assert_eq!(table.drop_sql(), "DROP TABLE IF EXISTS emp;");

        let index = SchemaObject::index("idx_emp", "CREATE INDEX idx_emp ON emp(x);");
        assert_eq!(index.drop_sql(), "DROP INDEX IF EXISTS idx_emp;");
    }

    #[test]
    fn test_drop_order_is_reverse_of_creation_order() {
        let schema = SchemaSet::new()
            .with(SchemaObject::table("a", "CREATE TABLE a (x);"))
            .with(SchemaObject::table("b", "CREATE TABLE b (x);"))
            .with(SchemaObject::index("idx_b", "CREATE INDEX idx_b ON b(x);"));

        let names: Vec<_> = schema.drop_order().map(SchemaObject::name).collect();
        assert_eq!(names, ["idx_b", "b", "a"]);
    }

    #[test]
    fn test_validate_rejects_bad_object_name() {
        let schema = SchemaSet::new().with(SchemaObject::table("bad name", "CREATE TABLE x (y);"));
        assert!(schema.validate().is_err());
    }
}
