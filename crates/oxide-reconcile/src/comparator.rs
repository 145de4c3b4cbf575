//! Structural diff of two table structures.
//!
//! The comparator looks at the live ("new") structure and the one
//! reconstructed from migrations ("old") and fills a [`Blueprint`] with the
//! changes needed to bring the migrations up to date. Categories are visited
//! in a fixed order (columns, foreign keys, primary key, indexes) and, within
//! each, missing items come first, then excessive, then differing ones, so the
//! descriptions read in the order a user expects.
//!
//! In apply mode an operation the dialect cannot express aborts the
//! comparison with [`ReconcileError::UnsupportedOperation`]. In show-only
//! mode the comparison always completes; such operations are reported as an
//! extra description instead.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::blueprint::Blueprint;
use crate::dialect::{strip_key_markers, strip_primary_key_info, Dialect, EngineVersion, SchemaOperation};
use crate::error::{ReconcileError, Result};
use crate::length::lengths_match;
use crate::schema::{Column, ForeignKeyAction, Structure};

fn quoted(value: Option<&str>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("\"{v}\""))
}

fn joined(values: &[String]) -> String {
    values.join(", ")
}

fn action(action: Option<ForeignKeyAction>) -> Option<&'static str> {
    action.map(|a| a.to_sql())
}

fn as_set(values: &[String]) -> HashSet<&str> {
    values.iter().map(String::as_str).collect()
}

/// Compares table structures for one dialect.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    dialect: Dialect,
    engine_version: Option<EngineVersion>,
    only_show: bool,
}

impl Comparator {
    /// Creates a comparator in apply mode.
    #[must_use]
    pub fn new(dialect: Dialect, engine_version: Option<EngineVersion>) -> Self {
        Self {
            dialect,
            engine_version,
            only_show: false,
        }
    }

    /// Switches show-only mode: describe differences without queueing
    /// changes, never failing on unsupported operations.
    ///
    /// Show-only blueprints carry descriptions and no queued operations,
    /// including for missing columns.
    #[must_use]
    pub fn only_show(mut self, only_show: bool) -> Self {
        self.only_show = only_show;
        self
    }

    /// Compares `new` against `old` and returns the resulting blueprint.
    pub fn diff(&self, new: &Structure, old: &Structure) -> Result<Blueprint> {
        let mut blueprint = Blueprint::new(new.name.clone());
        self.compare(new, old, &mut blueprint)?;
        Ok(blueprint)
    }

    /// Compares `new` against `old`, populating `blueprint`.
    pub fn compare(&self, new: &Structure, old: &Structure, blueprint: &mut Blueprint) -> Result<()> {
        debug!(
            table = %new.name,
            dialect = %self.dialect,
            only_show = self.only_show,
            "Comparing structures"
        );
        self.compare_columns(new, old, blueprint)?;
        self.compare_foreign_keys(new, old, blueprint)?;
        self.compare_primary_keys(new, old, blueprint)?;
        self.compare_indexes(new, old, blueprint)?;
        Ok(())
    }

    /// Checks whether `operation` can be queued.
    ///
    /// Returns `Ok(false)` when nothing should be queued: in show-only mode,
    /// or when the dialect lacks the operation (a warning description is
    /// added then). Fails on unsupported operations in apply mode.
    fn can_queue(&self, operation: SchemaOperation, blueprint: &mut Blueprint) -> Result<bool> {
        if self.dialect.supports(operation) {
            return Ok(!self.only_show);
        }
        if !self.only_show {
            return Err(ReconcileError::unsupported(operation.sql_name(), self.dialect));
        }
        warn!(
            table = %blueprint.table_name(),
            operation = operation.sql_name(),
            dialect = %self.dialect,
            "Operation not supported by dialect"
        );
        blueprint.add_description(format!(
            "(!) {} is not supported by {}: Migration must be created manually",
            operation.sql_name(),
            self.dialect.display_name()
        ));
        Ok(false)
    }

    fn compare_columns(&self, new: &Structure, old: &Structure, blueprint: &mut Blueprint) -> Result<()> {
        let mut previous: Option<&str> = None;
        for column in &new.columns {
            if old.get_column(&column.name).is_none() {
                blueprint.add_description(format!("missing column '{}'", column.name));
                if self.can_queue(SchemaOperation::AddColumn, blueprint)? {
                    let mut added = column.clone();
                    match previous {
                        Some(after) => {
                            added.after = Some(after.to_string());
                            added.first = false;
                        }
                        None => {
                            added.after = None;
                            added.first = true;
                        }
                    }
                    blueprint.add_column(added);
                }
            }
            previous = Some(&column.name);
        }

        for column in &old.columns {
            if new.get_column(&column.name).is_none() {
                blueprint.add_description(format!("excessive column '{}'", column.name));
                if self.can_queue(SchemaOperation::DropColumn, blueprint)? {
                    blueprint.drop_column(column.clone());
                }
            }
        }

        for column in &new.columns {
            let Some(old_column) = old.get_column(&column.name) else {
                continue;
            };
            if let Some(difference) = self.column_difference(column, old_column) {
                blueprint.add_description(format!(
                    "different '{}' column property: {difference}",
                    column.name
                ));
                if self.can_queue(SchemaOperation::AlterColumn, blueprint)? {
                    blueprint.alter_column(column.clone(), old_column.clone());
                }
            }
        }

        Ok(())
    }

    /// Describes the first property in which the columns differ.
    fn column_difference(&self, new: &Column, old: &Column) -> Option<String> {
        let describe = |property: &str, new: Option<&str>, old: Option<&str>| {
            format!("{property} (DB: {} != MIG: {})", quoted(new), quoted(old))
        };
        let flag = |value: bool| if value { "true" } else { "false" };

        if new.column_type != old.column_type {
            return Some(describe(
                "type",
                Some(new.column_type.as_str()),
                Some(old.column_type.as_str()),
            ));
        }
        if new.nullable != old.nullable {
            return Some(describe(
                "not null",
                Some(flag(!new.nullable)),
                Some(flag(!old.nullable)),
            ));
        }

        let version = self.engine_version.as_ref();
        let new_length = new.length(self.dialect, version);
        let old_length = old.length(self.dialect, version);
        if !lengths_match(new.column_type, new_length.as_deref(), old_length.as_deref()) {
            return Some(describe("length", new_length.as_deref(), old_length.as_deref()));
        }

        if new.unique != old.unique {
            return Some(describe("unique", Some(flag(new.unique)), Some(flag(old.unique))));
        }
        if new.unsigned != old.unsigned {
            return Some(describe(
                "unsigned",
                Some(flag(new.unsigned)),
                Some(flag(old.unsigned)),
            ));
        }
        if new.default != old.default {
            return Some(describe(
                "default",
                new.default.to_sql().as_deref(),
                old.default.to_sql().as_deref(),
            ));
        }
        if !self.appends_match(new, old) {
            return Some(describe("append", new.append.as_deref(), old.append.as_deref()));
        }
        if new.comment != old.comment {
            return Some(describe("comment", new.comment.as_deref(), old.comment.as_deref()));
        }
        None
    }

    /// Compares append SQL, tolerating inline key markers in the old
    /// definition that only restate the new column's own flags.
    fn appends_match(&self, new: &Column, old: &Column) -> bool {
        let normalize = |append: &str| append.split_whitespace().collect::<Vec<_>>().join(" ");
        let new_append = normalize(new.append_str());
        let old_append = normalize(old.append_str());
        if new_append == old_append {
            return true;
        }
        if !new_append.is_empty() {
            return false;
        }

        let stripped = strip_key_markers(self.dialect, &old_append);
        let auto_increment_matches = self.dialect.auto_increment_keyword().is_none()
            || stripped.auto_increment == new.auto_increment;
        stripped.residue.is_empty()
            && stripped.primary_key == new.primary_key
            && auto_increment_matches
    }

    fn compare_foreign_keys(&self, new: &Structure, old: &Structure, blueprint: &mut Blueprint) -> Result<()> {
        for fk in &new.foreign_keys {
            if old.get_foreign_key(&fk.name).is_none() {
                blueprint.add_description(format!("missing foreign key '{}'", fk.name));
                if self.can_queue(SchemaOperation::AddForeignKey, blueprint)? {
                    blueprint.add_foreign_key(fk.clone());
                }
            }
        }

        for fk in &old.foreign_keys {
            if new.get_foreign_key(&fk.name).is_none() {
                blueprint.add_description(format!("excessive foreign key '{}'", fk.name));
                if self.can_queue(SchemaOperation::DropForeignKey, blueprint)? {
                    blueprint.drop_foreign_key(fk.clone());
                }
            }
        }

        for fk in &new.foreign_keys {
            let Some(old_fk) = old.get_foreign_key(&fk.name) else {
                continue;
            };

            let mut differences = Vec::new();
            if fk.columns != old_fk.columns {
                differences.push(format!(
                    "different foreign key '{}' columns (DB: {} != MIG: {})",
                    fk.name,
                    quoted(Some(&joined(&fk.columns))),
                    quoted(Some(&joined(&old_fk.columns)))
                ));
            }
            if fk.referenced_columns != old_fk.referenced_columns {
                differences.push(format!(
                    "different foreign key '{}' referred columns (DB: {} != MIG: {})",
                    fk.name,
                    quoted(Some(&joined(&fk.referenced_columns))),
                    quoted(Some(&joined(&old_fk.referenced_columns)))
                ));
            }
            if fk.referenced_table != old_fk.referenced_table {
                differences.push(format!(
                    "different foreign key '{}' referred table (DB: {} != MIG: {})",
                    fk.name,
                    quoted(Some(&fk.referenced_table)),
                    quoted(Some(&old_fk.referenced_table))
                ));
            }
            if fk.on_delete != old_fk.on_delete {
                differences.push(format!(
                    "different foreign key '{}' ON DELETE constraint (DB: {} != MIG: {})",
                    fk.name,
                    quoted(action(fk.on_delete)),
                    quoted(action(old_fk.on_delete))
                ));
            }
            if fk.on_update != old_fk.on_update {
                differences.push(format!(
                    "different foreign key '{}' ON UPDATE constraint (DB: {} != MIG: {})",
                    fk.name,
                    quoted(action(fk.on_update)),
                    quoted(action(old_fk.on_update))
                ));
            }

            if differences.is_empty() {
                continue;
            }
            for difference in differences {
                blueprint.add_description(difference);
            }
            let drop = self.can_queue(SchemaOperation::DropForeignKey, blueprint)?;
            let add = self.can_queue(SchemaOperation::AddForeignKey, blueprint)?;
            if drop && add {
                blueprint.drop_foreign_key(old_fk.clone());
                blueprint.add_foreign_key(fk.clone());
            }
        }

        Ok(())
    }

    fn compare_primary_keys(&self, new: &Structure, old: &Structure, blueprint: &mut Blueprint) -> Result<()> {
        let new_columns = new.primary_key_columns();
        let old_columns = old.primary_key_columns();
        if as_set(new_columns) == as_set(old_columns) {
            return Ok(());
        }

        blueprint.add_description("different primary key definition");

        if let Some(old_key) = old.primary_key.as_ref().filter(|pk| !pk.is_empty()) {
            if self.can_queue(SchemaOperation::DropPrimaryKey, blueprint)? {
                blueprint.drop_primary_key(old_key.clone());
            }
        }

        let Some(new_key) = new.primary_key.as_ref().filter(|pk| !pk.is_empty()) else {
            return Ok(());
        };
        if !self.can_queue(SchemaOperation::AddPrimaryKey, blueprint)? {
            return Ok(());
        }

        if new_key.is_composite() {
            for name in &new_key.columns {
                if let Some(column) = blueprint.queued_column_mut(name) {
                    if column.has_primary_key_info() {
                        column.append = strip_primary_key_info(self.dialect, column.append_str());
                    }
                }
            }
            blueprint.add_primary_key(new_key.clone());
        } else {
            let embedded = blueprint
                .queued_column(&new_key.columns[0])
                .is_some_and(Column::has_primary_key_info);
            if !embedded {
                blueprint.add_primary_key(new_key.clone());
            }
        }

        Ok(())
    }

    fn compare_indexes(&self, new: &Structure, old: &Structure, blueprint: &mut Blueprint) -> Result<()> {
        for index in &new.indexes {
            if old.get_index(&index.name).is_none() {
                blueprint.add_description(format!("missing index '{}'", index.name));
                if self.can_queue(SchemaOperation::CreateIndex, blueprint)? {
                    blueprint.create_index(index.clone());
                }
            }
        }

        for index in &old.indexes {
            if new.get_index(&index.name).is_none() {
                blueprint.add_description(format!("excessive index '{}'", index.name));
                if self.can_queue(SchemaOperation::DropIndex, blueprint)? {
                    blueprint.drop_index(index.clone());
                }
            }
        }

        for index in &new.indexes {
            let Some(old_index) = old.get_index(&index.name) else {
                continue;
            };

            let uniqueness = |unique: bool| if unique { "unique" } else { "not unique" };
            let mut differs = false;
            if index.unique != old_index.unique {
                differs = true;
                blueprint.add_description(format!(
                    "different index '{}' definition (DB: {} != MIG: {})",
                    index.name,
                    uniqueness(index.unique),
                    uniqueness(old_index.unique)
                ));
            }
            if as_set(&index.columns) != as_set(&old_index.columns) {
                differs = true;
                blueprint.add_description(format!(
                    "different index '{}' columns (DB: {} != MIG: {})",
                    index.name,
                    quoted(Some(&joined(&index.columns))),
                    quoted(Some(&joined(&old_index.columns)))
                ));
            }

            if differs {
                let drop = self.can_queue(SchemaOperation::DropIndex, blueprint)?;
                let add = self.can_queue(SchemaOperation::CreateIndex, blueprint)?;
                if drop && add {
                    blueprint.drop_index(old_index.clone());
                    blueprint.create_index(index.clone());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, DefaultValue, ForeignKey, Index, PrimaryKey};
    use pretty_assertions::assert_eq;

    fn users() -> Structure {
        Structure::new("users")
            .column(
                Column::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment()
                    .append("AUTO_INCREMENT PRIMARY KEY"),
            )
            .column(Column::new("email", ColumnType::String).size(255).not_null())
            .column(Column::new("balance", ColumnType::Decimal).precision(10, Some(2)))
            .column(Column::new("team_id", ColumnType::Integer))
            .foreign_key(
                ForeignKey::new("fk_team", ["team_id"], "teams", ["id"])
                    .on_delete(ForeignKeyAction::Cascade),
            )
            .index(Index::new("idx_email", ["email"], true))
    }

    fn apply(dialect: Dialect) -> Comparator {
        Comparator::new(dialect, None)
    }

    fn show(dialect: Dialect) -> Comparator {
        Comparator::new(dialect, None).only_show(true)
    }

    #[test]
    fn test_comparison_is_reflexive_for_every_dialect() {
        let table = users();
        for dialect in Dialect::ALL {
            for comparator in [apply(dialect), show(dialect)] {
                let blueprint = comparator.diff(&table, &table.clone()).unwrap();
                assert!(blueprint.descriptions().is_empty(), "{dialect}");
                assert!(!blueprint.is_pending());
            }
        }
    }

    #[test]
    fn test_missing_columns_carry_ordering_hints() {
        let old = Structure::new("users")
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("name", ColumnType::String));
        let new = Structure::new("users")
            .column(Column::new("created_at", ColumnType::Integer))
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("email", ColumnType::String))
            .column(Column::new("phone", ColumnType::String))
            .column(Column::new("name", ColumnType::String));

        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "missing column 'created_at'",
                "missing column 'email'",
                "missing column 'phone'",
            ]
        );
        let added = blueprint.added_columns();
        assert!(added[0].first);
        assert_eq!(added[0].after, None);
        assert_eq!(added[1].after.as_deref(), Some("id"));
        assert_eq!(added[2].after.as_deref(), Some("email"));
    }

    #[test]
    fn test_show_only_mode_queues_nothing() {
        let old = Structure::new("users").column(Column::new("id", ColumnType::Integer));
        let new = old.clone().column(Column::new("email", ColumnType::String));

        let blueprint = show(Dialect::Mysql).diff(&new, &old).unwrap();

        assert_eq!(blueprint.descriptions(), ["missing column 'email'"]);
        assert!(blueprint.added_columns().is_empty());
        assert!(blueprint.is_pending());
    }

    #[test]
    fn test_categories_are_described_in_order() {
        let old = users();
        let mut new = users()
            .column(Column::new("nickname", ColumnType::String))
            .index(Index::new("idx_team", ["team_id"], false));
        new.remove_column("balance");
        new.remove_foreign_key("fk_team");
        new.get_column_mut("email").unwrap().size = Some(320);

        let blueprint = apply(Dialect::Pgsql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "missing column 'nickname'",
                "excessive column 'balance'",
                "different 'email' column property: length (DB: \"320\" != MIG: \"255\")",
                "excessive foreign key 'fk_team'",
                "missing index 'idx_team'",
            ]
        );
        assert_eq!(blueprint.dropped_column_names().collect::<Vec<_>>(), ["balance"]);
        assert_eq!(blueprint.altered_columns()[0].size, Some(320));
        assert_eq!(blueprint.unaltered_columns()[0].size, Some(255));
        assert_eq!(blueprint.dropped_foreign_keys()[0].name, "fk_team");
        assert_eq!(blueprint.added_indexes()[0].name, "idx_team");
    }

    #[test]
    fn test_only_first_column_difference_is_reported() {
        let old = Structure::new("t").column(Column::new("a", ColumnType::Integer));
        let new = Structure::new("t").column(
            Column::new("a", ColumnType::BigInteger)
                .not_null()
                .default_value(DefaultValue::Integer(1)),
        );

        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            ["different 'a' column property: type (DB: \"bigint\" != MIG: \"integer\")"]
        );
        assert_eq!(blueprint.altered_columns().len(), 1);
    }

    #[test]
    fn test_property_comparison_order() {
        let base = Column::new("a", ColumnType::String).size(10);
        let cases = [
            (base.clone().not_null(), "not null (DB: \"true\" != MIG: \"false\")"),
            (base.clone().unique(), "unique (DB: \"true\" != MIG: \"false\")"),
            (base.clone().unsigned(), "unsigned (DB: \"true\" != MIG: \"false\")"),
            (
                base.clone().default_value(DefaultValue::String("x".to_string())),
                "default (DB: \"'x'\" != MIG: null)",
            ),
            (
                base.clone().append("COLLATE utf8mb4_bin"),
                "append (DB: \"COLLATE utf8mb4_bin\" != MIG: null)",
            ),
            (base.clone().comment("note"), "comment (DB: \"note\" != MIG: null)"),
        ];

        let old = Structure::new("t").column(base);
        for (column, expected) in cases {
            let new = Structure::new("t").column(column);
            let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();
            assert_eq!(
                blueprint.descriptions(),
                [format!("different 'a' column property: {expected}")]
            );
        }
    }

    #[test]
    fn test_decimal_length_normalization() {
        let old = Structure::new("t").column(Column::new("price", ColumnType::Decimal).precision(10, None));
        let new = Structure::new("t")
            .column(Column::new("price", ColumnType::Decimal).precision(10, Some(0)));
        assert!(apply(Dialect::Mysql).diff(&new, &old).unwrap().descriptions().is_empty());

        let old = Structure::new("t")
            .column(Column::new("price", ColumnType::Decimal).precision(9, Some(0)));
        let new = Structure::new("t").column(Column::new("price", ColumnType::Decimal).precision(9, None));
        assert!(apply(Dialect::Mysql).diff(&new, &old).unwrap().descriptions().is_empty());
    }

    #[test]
    fn test_redundant_inline_key_markers_are_tolerated() {
        let old = Structure::new("t").column(
            Column::new("id", ColumnType::Integer)
                .primary_key()
                .append("AUTO_INCREMENT PRIMARY KEY"),
        );
        let new = Structure::new("t").column(
            Column::new("id", ColumnType::Integer)
                .primary_key()
                .auto_increment(),
        );
        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();
        assert!(blueprint.descriptions().is_empty());

        // Without auto-increment on the live column the marker is a real difference.
        let new = Structure::new("t").column(Column::new("id", ColumnType::Integer).primary_key());
        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();
        assert_eq!(
            blueprint.descriptions(),
            ["different 'id' column property: append (DB: null != MIG: \"AUTO_INCREMENT PRIMARY KEY\")"]
        );
    }

    #[test]
    fn test_sqlite_drop_column_fails_in_apply_mode() {
        let old = Structure::new("t")
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("legacy", ColumnType::String));
        let new = Structure::new("t").column(Column::new("id", ColumnType::Integer));

        let mut blueprint = Blueprint::new("t");
        let err = apply(Dialect::Sqlite)
            .compare(&new, &old, &mut blueprint)
            .unwrap_err();

        assert_eq!(err.to_string(), "DROP COLUMN is not supported by SQLite.");
        assert_eq!(blueprint.dropped_columns().len(), 0);
    }

    #[test]
    fn test_sqlite_drop_column_is_described_in_show_mode() {
        let old = Structure::new("t")
            .column(Column::new("id", ColumnType::Integer))
            .column(Column::new("legacy", ColumnType::String));
        let new = Structure::new("t").column(Column::new("id", ColumnType::Integer));

        let blueprint = show(Dialect::Sqlite).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "excessive column 'legacy'",
                "(!) DROP COLUMN is not supported by SQLite: Migration must be created manually",
            ]
        );
    }

    #[test]
    fn test_sqlite_alter_column_fails_in_apply_mode_and_warns_in_show_mode() {
        let old = Structure::new("t").column(Column::new("a", ColumnType::String).size(10));
        let new = Structure::new("t").column(Column::new("a", ColumnType::String).size(10).not_null());

        let err = apply(Dialect::Sqlite).diff(&new, &old).unwrap_err();
        assert_eq!(err.to_string(), "ALTER COLUMN is not supported by SQLite.");

        let blueprint = show(Dialect::Sqlite).diff(&new, &old).unwrap();
        assert_eq!(
            blueprint.descriptions(),
            [
                "different 'a' column property: not null (DB: \"true\" != MIG: \"false\")",
                "(!) ALTER COLUMN is not supported by SQLite: Migration must be created manually",
            ]
        );
        assert!(blueprint.altered_columns().is_empty());
    }

    #[test]
    fn test_sqlite_primary_key_change_fails_in_apply_mode_and_warns_in_show_mode() {
        let old = Structure::new("t")
            .column(Column::new("a", ColumnType::Integer))
            .column(Column::new("b", ColumnType::Integer))
            .primary_key(PrimaryKey::new(["a"]));
        let new = old.clone().primary_key(PrimaryKey::new(["a", "b"]));

        let err = apply(Dialect::Sqlite).diff(&new, &old).unwrap_err();
        assert_eq!(err.to_string(), "DROP PRIMARY KEY is not supported by SQLite.");

        let blueprint = show(Dialect::Sqlite).diff(&new, &old).unwrap();
        assert_eq!(
            blueprint.descriptions(),
            [
                "different primary key definition",
                "(!) DROP PRIMARY KEY is not supported by SQLite: Migration must be created manually",
                "(!) ADD PRIMARY KEY is not supported by SQLite: Migration must be created manually",
            ]
        );
        assert_eq!(blueprint.dropped_primary_key(), None);
        assert_eq!(blueprint.added_primary_key(), None);
    }

    #[test]
    fn test_sqlite_supports_adding_columns_and_indexes() {
        let old = Structure::new("t").column(Column::new("id", ColumnType::Integer));
        let new = old
            .clone()
            .column(Column::new("email", ColumnType::String))
            .index(Index::new("idx_email", ["email"], false));

        let blueprint = apply(Dialect::Sqlite).diff(&new, &old).unwrap();

        assert_eq!(blueprint.added_columns().len(), 1);
        assert_eq!(blueprint.added_indexes().len(), 1);
    }

    #[test]
    fn test_foreign_key_differences_are_each_described() {
        let old = users();
        let mut new = users();
        new.foreign_keys[0] = ForeignKey::new("fk_team", ["team_id"], "groups", ["uuid"])
            .on_update(ForeignKeyAction::Restrict);

        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "different foreign key 'fk_team' referred columns (DB: \"uuid\" != MIG: \"id\")",
                "different foreign key 'fk_team' referred table (DB: \"groups\" != MIG: \"teams\")",
                "different foreign key 'fk_team' ON DELETE constraint (DB: null != MIG: \"CASCADE\")",
                "different foreign key 'fk_team' ON UPDATE constraint (DB: \"RESTRICT\" != MIG: null)",
            ]
        );
        assert_eq!(blueprint.dropped_foreign_keys()[0].referenced_table, "teams");
        assert_eq!(blueprint.added_foreign_keys()[0].referenced_table, "groups");
    }

    #[test]
    fn test_sqlite_foreign_key_change_fails_in_apply_mode() {
        let old = users();
        let mut new = users();
        new.foreign_keys[0].on_delete = None;

        let err = apply(Dialect::Sqlite).diff(&new, &old).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnsupportedOperation { ref operation, .. } if operation == "DROP FOREIGN KEY"
        ));

        let blueprint = show(Dialect::Sqlite).diff(&new, &old).unwrap();
        assert_eq!(blueprint.descriptions().len(), 3);
    }

    #[test]
    fn test_primary_key_change_to_composite_strips_inline_markers() {
        let old = Structure::new("t").column(
            Column::new("id", ColumnType::Integer)
                .primary_key()
                .append("PRIMARY KEY"),
        );
        let new = Structure::new("t")
            .column(
                Column::new("id", ColumnType::Integer)
                    .primary_key()
                    .append("PRIMARY KEY COMMENT 'x'"),
            )
            .column(Column::new("tenant", ColumnType::Integer).primary_key());

        let blueprint = apply(Dialect::Pgsql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "missing column 'tenant'",
                "different 'id' column property: append (DB: \"PRIMARY KEY COMMENT 'x'\" != MIG: \"PRIMARY KEY\")",
                "different primary key definition",
            ]
        );
        assert_eq!(blueprint.dropped_primary_key(), Some(&PrimaryKey::new(["id"])));
        assert_eq!(
            blueprint.added_primary_key(),
            Some(&PrimaryKey::new(["id", "tenant"]))
        );
        assert_eq!(
            blueprint.queued_column("id").unwrap().append.as_deref(),
            Some("COMMENT 'x'")
        );
    }

    #[test]
    fn test_single_column_key_embedded_in_added_column_is_not_added_twice() {
        let old = Structure::new("t").column(Column::new("name", ColumnType::String));
        let new = Structure::new("t")
            .column(
                Column::new("id", ColumnType::Integer)
                    .primary_key()
                    .auto_increment()
                    .append("AUTO_INCREMENT PRIMARY KEY"),
            )
            .column(Column::new("name", ColumnType::String));

        let blueprint = apply(Dialect::Mysql).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            ["missing column 'id'", "different primary key definition"]
        );
        assert_eq!(blueprint.added_primary_key(), None);
        assert_eq!(blueprint.dropped_primary_key(), None);
    }

    #[test]
    fn test_primary_key_order_is_ignored() {
        let old = Structure::new("t")
            .column(Column::new("a", ColumnType::Integer))
            .column(Column::new("b", ColumnType::Integer))
            .primary_key(PrimaryKey::new(["a", "b"]));
        let new = old.clone().primary_key(PrimaryKey::new(["b", "a"]));

        assert!(apply(Dialect::Sqlite).diff(&new, &old).unwrap().descriptions().is_empty());
    }

    #[test]
    fn test_index_redefinition_is_drop_and_create() {
        let old = users();
        let mut new = users();
        new.indexes[0] = Index::new("idx_email", ["email", "team_id"], false);

        let blueprint = apply(Dialect::Sqlite).diff(&new, &old).unwrap();

        assert_eq!(
            blueprint.descriptions(),
            [
                "different index 'idx_email' definition (DB: not unique != MIG: unique)",
                "different index 'idx_email' columns (DB: \"email, team_id\" != MIG: \"email\")",
            ]
        );
        assert_eq!(blueprint.dropped_indexes()[0].columns, ["email"]);
        assert_eq!(blueprint.added_indexes()[0].columns, ["email", "team_id"]);
    }
}
