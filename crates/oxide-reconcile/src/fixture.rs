//! JSON snapshots of a database and its migrations.
//!
//! A [`Snapshot`] bundles the live table structures, the applied history and
//! the raw changes of every migration. It implements all three collaborator
//! traits, so the whole pipeline can run offline, e.g. from the CLI or in
//! tests.
//!
//! ```json
//! {
//!   "structures": [{ "name": "users", "columns": [{ "name": "id", "type": "pk" }] }],
//!   "history": [{ "migration": "m240101_000000_init", "applied_at": "2024-01-01T00:00:00Z" }],
//!   "migrations": {
//!     "m240101_000000_init": [
//!       { "table": "users", "method": "createTable", "value": [{ "name": "id", "type": "pk" }] }
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arranger::StructureProvider;
use crate::change::{RawStructureChange, StructureChange};
use crate::error::{ReconcileError, Result};
use crate::history::{sort_history, HistoryEntry, HistorySource};
use crate::inspector::{ChangeExtractor, ChangeSet, ExtractorContext};
use crate::schema::Structure;

/// Offline snapshot of live structures and migration history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Live table structures.
    pub structures: Vec<Structure>,
    /// Applied migrations, in any order.
    pub history: Vec<HistoryEntry>,
    /// Raw changes per migration id, each list oldest first.
    pub migrations: BTreeMap<String, Vec<RawStructureChange>>,
}

impl Snapshot {
    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading snapshot");
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Writes the snapshot as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Returns the live table names in snapshot order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.structures.iter().map(|s| s.name.as_str())
    }

    /// Records a migration and its changes, applied at `entry.applied_at`.
    pub fn record(&mut self, entry: HistoryEntry, changes: &[StructureChange]) -> Result<()> {
        let raw = changes
            .iter()
            .map(StructureChange::to_raw)
            .collect::<Result<Vec<_>>>()?;
        self.migrations.insert(entry.migration.clone(), raw);
        self.history.push(entry);
        Ok(())
    }
}

impl StructureProvider for Snapshot {
    fn structure_of(&self, table: &str) -> Result<Option<Structure>> {
        Ok(self.structures.iter().find(|s| s.name == table).cloned())
    }
}

impl HistorySource for Snapshot {
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut history = self.history.clone();
        sort_history(&mut history);
        Ok(history)
    }
}

impl ChangeExtractor for Snapshot {
    fn changes_for(&self, migration: &str, _context: &ExtractorContext) -> Result<Option<ChangeSet>> {
        let Some(raw_changes) = self.migrations.get(migration) else {
            return Ok(None);
        };

        let mut changes = ChangeSet::new();
        for raw in raw_changes {
            let change = StructureChange::try_from(raw.clone()).map_err(|e| ReconcileError::Extraction {
                migration: migration.to_string(),
                message: e.to_string(),
            })?;
            changes
                .entry(change.table().to_string())
                .or_default()
                .push(change);
        }
        Ok(Some(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::schema::{Column, ColumnType};
    use chrono::DateTime;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::from_json(
            &json!({
                "structures": [
                    {"name": "users", "columns": [{"name": "id", "type": "pk"}]}
                ],
                "history": [
                    {"migration": "m240101_000000_init", "applied_at": "2024-01-01T00:00:00Z"},
                    {"migration": "m240102_000000_email", "applied_at": "2024-01-02T00:00:00Z"}
                ],
                "migrations": {
                    "m240101_000000_init": [
                        {"table": "users", "method": "createTable", "value": [{"name": "id", "type": "pk"}]}
                    ],
                    "m240102_000000_email": [
                        {"table": "users", "method": "addColumn", "value": {"name": "email", "type": "string"}},
                        {"table": "posts", "method": "dropTable"}
                    ]
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_history_is_served_newest_first() {
        let history = snapshot().fetch_history().unwrap();
        assert_eq!(history[0].migration, "m240102_000000_email");
        assert_eq!(history[1].migration, "m240101_000000_init");
    }

    #[test]
    fn test_changes_are_decoded_and_grouped_by_table() {
        let changes = snapshot()
            .changes_for("m240102_000000_email", &ExtractorContext::default())
            .unwrap()
            .unwrap();

        assert_eq!(changes.len(), 2);
        assert!(matches!(changes["users"][0].value(), Change::AddColumn(c) if c.name == "email"));
        assert!(matches!(changes["posts"][0].value(), Change::DropTable));
    }

    #[test]
    fn test_unknown_migration_has_no_changes() {
        let changes = snapshot()
            .changes_for("m200101_000000_missing", &ExtractorContext::default())
            .unwrap();
        assert!(changes.is_none());
    }

    #[test]
    fn test_malformed_change_is_an_extraction_error() {
        let mut snapshot = snapshot();
        snapshot.migrations.insert(
            "m240103_000000_bad".to_string(),
            vec![RawStructureChange {
                table: "users".to_string(),
                method: "dropColumn".to_string(),
                value: json!({"name": "email"}),
            }],
        );

        let err = snapshot
            .changes_for("m240103_000000_bad", &ExtractorContext::default())
            .unwrap_err();

        match err {
            ReconcileError::Extraction { migration, message } => {
                assert_eq!(migration, "m240103_000000_bad");
                assert!(message.contains("dropColumn"), "{message}");
            }
            other => panic!("Expected Extraction, got {other:?}"),
        }
    }

    #[test]
    fn test_record_stores_raw_changes() {
        let mut snapshot = Snapshot::default();
        let applied_at = DateTime::from_timestamp(0, 0).unwrap();
        snapshot
            .record(
                HistoryEntry::new("m700101_000000_init", applied_at),
                &[StructureChange::new(
                    "users",
                    Change::CreateTable(vec![Column::new("id", ColumnType::PrimaryKey)]),
                )],
            )
            .unwrap();

        assert_eq!(snapshot.migrations["m700101_000000_init"][0].method, "createTable");
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(
            snapshot.structure_of("users").unwrap(),
            None,
            "recording history does not touch live structures"
        );
    }
}
