//! Structure reconstruction from recorded changes.
//!
//! Replaying every change recorded for a table, oldest first, onto an empty
//! [`Structure`] yields the table as the migrations expect it to be. The
//! [`Comparator`](crate::comparator::Comparator) compares that against the
//! live table.

use std::collections::HashMap;

use tracing::debug;

use crate::change::{Change, StructureChange};
use crate::dialect::{primary_key_append, strip_primary_key_info, Dialect};
use crate::error::{ReconcileError, Result};
use crate::schema::{Column, Index, PrimaryKey, Structure};

/// Rebuilds a table structure by replaying changes.
#[derive(Debug)]
pub struct StructureBuilder {
    dialect: Dialect,
    structure: Structure,
    /// Index name -> column whose unique flag that index set.
    unique_from_index: HashMap<String, String>,
}

impl StructureBuilder {
    /// Creates a builder starting from an empty structure.
    #[must_use]
    pub fn new(table: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            dialect,
            structure: Structure::new(table),
            unique_from_index: HashMap::new(),
        }
    }

    /// Replays `changes` (oldest first) and returns the resulting structure.
    pub fn build<'a, I>(table: impl Into<String>, changes: I, dialect: Dialect) -> Result<Structure>
    where
        I: IntoIterator<Item = &'a StructureChange>,
    {
        let mut builder = Self::new(table, dialect);
        builder.apply_all(changes)?;
        Ok(builder.into_structure())
    }

    /// Returns the current structure.
    #[must_use]
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Consumes and returns the structure.
    #[must_use]
    pub fn into_structure(self) -> Structure {
        self.structure
    }

    /// Applies changes in order, stopping at the first error.
    pub fn apply_all<'a, I>(&mut self, changes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a StructureChange>,
    {
        for change in changes {
            self.apply(change)?;
        }
        Ok(())
    }

    /// Applies a single change.
    pub fn apply(&mut self, change: &StructureChange) -> Result<()> {
        match change.value() {
            Change::CreateTable(columns) => {
                for column in columns {
                    self.upsert_column(column.clone());
                }
            }

            Change::AddColumn(column) | Change::AlterColumn(column) => {
                self.upsert_column(column.clone());
            }

            Change::DropColumn(name) => self.drop_column(name),

            Change::RenameColumn(rename) => self.rename_column(&rename.old, &rename.new),

            Change::AddPrimaryKey(primary_key) => self.add_primary_key(primary_key),

            Change::DropPrimaryKey(_) => self.drop_primary_key(),

            Change::AddForeignKey(fk) => self.structure.set_foreign_key(fk.clone()),

            Change::DropForeignKey(name) => {
                self.structure.remove_foreign_key(name);
            }

            Change::CreateIndex(index) => self.create_index(index),

            Change::DropIndex(name) => self.drop_index(name),

            Change::AddCommentOnColumn(comment) => {
                if let Some(column) = self.structure.get_column_mut(&comment.column) {
                    column.comment = Some(comment.comment.clone());
                }
            }

            Change::DropCommentFromColumn(name) => {
                if let Some(column) = self.structure.get_column_mut(name) {
                    column.comment = None;
                }
            }

            Change::DropTable | Change::RenameTable(_) => {
                return Err(ReconcileError::Configuration(format!(
                    "'{}' of table '{}' cannot be replayed onto a structure",
                    change.method(),
                    change.table()
                )));
            }
        }

        Ok(())
    }

    fn upsert_column(&mut self, column: Column) {
        let carries_key = column.primary_key
            || column.column_type.is_primary_key_type()
            || column.has_primary_key_info();
        if carries_key {
            self.structure.fold_into_primary_key(&column.name);
        }
        self.structure.set_column(column);
    }

    fn drop_column(&mut self, name: &str) {
        if self.structure.remove_column(name).is_none() {
            debug!(table = %self.structure.name, column = name, "Dropping unknown column");
        }
        let key_emptied = self.structure.primary_key.as_mut().is_some_and(|pk| {
            pk.columns.retain(|c| c != name);
            pk.is_empty()
        });
        if key_emptied {
            self.structure.primary_key = None;
        }
    }

    fn rename_column(&mut self, old: &str, new: &str) {
        if self.structure.get_column(old).is_none() {
            debug!(table = %self.structure.name, column = old, "Renaming unknown column");
            return;
        }
        // The renamed column replaces any column already holding the new name.
        if new != old && self.structure.get_column(new).is_some() {
            self.drop_column(new);
            self.unique_from_index.retain(|_, column| column != new);
        }
        let Some(column) = self.structure.get_column_mut(old) else {
            return;
        };
        column.name = new.to_string();

        if let Some(pk) = &mut self.structure.primary_key {
            for key_column in &mut pk.columns {
                if key_column == old {
                    *key_column = new.to_string();
                }
            }
        }
        for column in self.unique_from_index.values_mut() {
            if column == old {
                *column = new.to_string();
            }
        }
    }

    fn add_primary_key(&mut self, primary_key: &PrimaryKey) {
        let dialect = self.dialect;
        for name in &primary_key.columns {
            let Some(column) = self.structure.get_column_mut(name) else {
                continue;
            };
            column.primary_key = true;
            let marker = primary_key_append(dialect, true, column.auto_increment).unwrap_or_default();
            if column.append_str().trim().is_empty() {
                column.append = Some(marker);
            } else if !column.has_primary_key_info() {
                column.append = Some(format!("{} {marker}", column.append_str().trim()));
            }
        }
        self.structure.primary_key = Some(primary_key.clone());
    }

    fn drop_primary_key(&mut self) {
        let Some(primary_key) = self.structure.primary_key.take() else {
            return;
        };
        for name in &primary_key.columns {
            if let Some(column) = self.structure.get_column_mut(name) {
                column.append = strip_primary_key_info(self.dialect, column.append_str());
                column.primary_key = false;
            }
        }
    }

    fn create_index(&mut self, index: &Index) {
        if let Some(name) = index.single_unique_column() {
            if let Some(column) = self.structure.get_column_mut(name) {
                if !column.unique {
                    column.unique = true;
                    self.unique_from_index
                        .insert(index.name.clone(), name.to_string());
                }
            }
        }
        self.structure.set_index(index.clone());
    }

    fn drop_index(&mut self, name: &str) {
        self.structure.remove_index(name);
        if let Some(column_name) = self.unique_from_index.remove(name) {
            if let Some(column) = self.structure.get_column_mut(&column_name) {
                column.unique = false;
            }
        }
    }
}
