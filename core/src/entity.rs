//! The entity contract: row materialization and the persistence capability set.
//!
//! The contract is split in two so that read-only projection types (joins,
//! aggregates) never have to implement members they cannot honor:
//!
//! - [`FromRow`] is the deserialization half. Any type a query returns
//!   implements it, projections included.
//! - [`Entity`] adds the persistence half — table name, identity column,
//!   mutable identity, and row serialization. Only types that map to one
//!   row in one table implement it, and only mutation operations require it.

use crate::row::RowValues;

/// The well-known identity column name, used unless an entity overrides
/// [`Entity::id_column`].
pub const ID_COLUMN: &str = "_id";

/// Materializes a value from a single result row.
///
/// The implementation must tolerate a null identity column: rows read from
/// ad-hoc projections may not carry one at all.
pub trait FromRow: Sized {
    /// Builds a fresh value from the current result row.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// The full persistence contract for a type stored as one row in one table.
///
/// An entity owns its field values and an optional numeric identity —
/// `None` until the first insert assigns one. It never owns a database
/// handle.
pub trait Entity: FromRow {
    /// The table this entity type is stored in. Constant per type.
    fn table_name() -> &'static str;

    /// The identity column name. Defaults to [`ID_COLUMN`].
    fn id_column() -> &'static str {
        ID_COLUMN
    }

    /// The current identity, or `None` if the entity was never persisted.
    fn id(&self) -> Option<i64>;

    /// Records the identity assigned by the storage engine.
    fn set_id(&mut self, id: i64);

    /// Serializes the entity's fields into column/value pairs.
    ///
    /// The identity column must not appear here: the identity is either
    /// database-assigned or supplied separately in a filter condition. The
    /// CRUD helper rejects rows that violate this.
    fn to_row(&self) -> RowValues;
}
