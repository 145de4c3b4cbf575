//! Blueprint: the change set of one table.
//!
//! A [`Blueprint`] is filled once by the
//! [`Comparator`](crate::comparator::Comparator) and then handed to a
//! renderer, which only reads it. Next to the forward changes it keeps the
//! definitions being replaced or removed, so a renderer can also produce the
//! reverse migration.

use serde::Serialize;

use crate::schema::{Column, ForeignKey, Index, PrimaryKey};

/// Structured, renderer-agnostic change set of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Blueprint {
    table_name: String,
    start_from_scratch: bool,
    descriptions: Vec<String>,
    columns_to_drop: Vec<Column>,
    columns_to_add: Vec<Column>,
    columns_to_alter: Vec<Column>,
    unaltered_columns: Vec<Column>,
    foreign_keys_to_drop: Vec<ForeignKey>,
    foreign_keys_to_add: Vec<ForeignKey>,
    primary_key_to_drop: Option<PrimaryKey>,
    primary_key_to_add: Option<PrimaryKey>,
    indexes_to_drop: Vec<Index>,
    indexes_to_add: Vec<Index>,
}

fn upsert_by<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

impl Blueprint {
    /// Creates an empty blueprint for `table_name`.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Marks that no incremental change is possible; the table has to be
    /// generated from scratch.
    pub fn start_from_scratch(&mut self) {
        self.start_from_scratch = true;
    }

    /// Returns `true` if the table has to be generated from scratch.
    #[must_use]
    pub fn needs_start_from_scratch(&self) -> bool {
        self.start_from_scratch
    }

    /// Returns `true` if anything has to be generated.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.start_from_scratch || !self.descriptions.is_empty()
    }

    /// Appends a human-readable description.
    pub fn add_description(&mut self, description: impl Into<String>) {
        self.descriptions.push(description.into());
    }

    /// Returns the descriptions in the order they were found.
    #[must_use]
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// Queues dropping `column` (kept whole for reversal).
    pub fn drop_column(&mut self, column: Column) {
        upsert_by(&mut self.columns_to_drop, column, |a, b| a.name == b.name);
    }

    /// Queues adding `column`.
    pub fn add_column(&mut self, column: Column) {
        upsert_by(&mut self.columns_to_add, column, |a, b| a.name == b.name);
    }

    /// Queues changing a column to `column`; `previous` is its current
    /// definition.
    pub fn alter_column(&mut self, column: Column, previous: Column) {
        upsert_by(&mut self.columns_to_alter, column, |a, b| a.name == b.name);
        upsert_by(&mut self.unaltered_columns, previous, |a, b| a.name == b.name);
    }

    /// Queues dropping a foreign key (kept whole for reversal).
    pub fn drop_foreign_key(&mut self, fk: ForeignKey) {
        upsert_by(&mut self.foreign_keys_to_drop, fk, |a, b| a.name == b.name);
    }

    /// Queues adding a foreign key.
    pub fn add_foreign_key(&mut self, fk: ForeignKey) {
        upsert_by(&mut self.foreign_keys_to_add, fk, |a, b| a.name == b.name);
    }

    /// Queues dropping the primary key.
    pub fn drop_primary_key(&mut self, primary_key: PrimaryKey) {
        self.primary_key_to_drop = Some(primary_key);
    }

    /// Queues adding the primary key.
    pub fn add_primary_key(&mut self, primary_key: PrimaryKey) {
        self.primary_key_to_add = Some(primary_key);
    }

    /// Queues dropping an index (kept whole for reversal).
    pub fn drop_index(&mut self, index: Index) {
        upsert_by(&mut self.indexes_to_drop, index, |a, b| a.name == b.name);
    }

    /// Queues creating an index.
    pub fn create_index(&mut self, index: Index) {
        upsert_by(&mut self.indexes_to_add, index, |a, b| a.name == b.name);
    }

    /// Columns to drop.
    #[must_use]
    pub fn dropped_columns(&self) -> &[Column] {
        &self.columns_to_drop
    }

    /// Names of the columns to drop.
    pub fn dropped_column_names(&self) -> impl Iterator<Item = &str> {
        self.columns_to_drop.iter().map(|c| c.name.as_str())
    }

    /// Columns to add, in table order.
    #[must_use]
    pub fn added_columns(&self) -> &[Column] {
        &self.columns_to_add
    }

    /// Columns to alter, with their new definitions.
    #[must_use]
    pub fn altered_columns(&self) -> &[Column] {
        &self.columns_to_alter
    }

    /// Previous definitions of the altered columns.
    #[must_use]
    pub fn unaltered_columns(&self) -> &[Column] {
        &self.unaltered_columns
    }

    /// Gets a queued added or altered column by name.
    #[must_use]
    pub fn queued_column(&self, name: &str) -> Option<&Column> {
        self.columns_to_add
            .iter()
            .chain(&self.columns_to_alter)
            .find(|c| c.name == name)
    }

    /// Gets a mutable queued added or altered column by name.
    pub fn queued_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns_to_add
            .iter_mut()
            .chain(self.columns_to_alter.iter_mut())
            .find(|c| c.name == name)
    }

    /// Foreign keys to drop.
    #[must_use]
    pub fn dropped_foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys_to_drop
    }

    /// Foreign keys to add.
    #[must_use]
    pub fn added_foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys_to_add
    }

    /// Primary key to drop.
    #[must_use]
    pub fn dropped_primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key_to_drop.as_ref()
    }

    /// Primary key to add.
    #[must_use]
    pub fn added_primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key_to_add.as_ref()
    }

    /// Indexes to drop.
    #[must_use]
    pub fn dropped_indexes(&self) -> &[Index] {
        &self.indexes_to_drop
    }

    /// Indexes to create.
    #[must_use]
    pub fn added_indexes(&self) -> &[Index] {
        &self.indexes_to_add
    }
}
