//! Ordered column/value pairs produced by [`Entity::to_row`].
//!
//! [`Entity::to_row`]: crate::Entity::to_row

use rusqlite::types::Value;

/// A row serialization: column names paired with owned SQL values, in the
/// order the entity listed them.
///
/// Produced by an entity, consumed by the insert/update operations. By
/// contract it never includes the identity column.
///
/// # Examples
///
/// ```
/// use rowkit_core::RowValues;
///
/// let row = RowValues::new()
///     .with("first_name", "Ann".to_string())
///     .with("last_name", "Lee".to_string());
/// assert_eq!(row.len(), 2);
/// assert!(row.contains("first_name"));
/// assert!(!row.contains("_id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RowValues {
    pairs: Vec<(String, Value)>,
}

impl RowValues {
    /// Creates an empty row serialization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column/value pair, consuming and returning `self` for
    /// builder-style construction.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Appends a column/value pair.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((column.into(), value.into()));
    }

    /// Whether a column of the given name is present.
    pub fn contains(&self, column: &str) -> bool {
        self.pairs.iter().any(|(name, _)| name == column)
    }

    /// The column/value pairs in declaration order.
    pub fn pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no columns were recorded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
