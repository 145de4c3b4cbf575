//! History inspection.
//!
//! The [`Inspector`] answers "does this table need a migration?". It walks
//! the applied history newest first, collects the changes recorded for the
//! table (following renames back to earlier names), replays them into the
//! structure the migrations describe, and compares that with the live table.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::arranger::{Arrangement, Arranger, StructureProvider};
use crate::blueprint::Blueprint;
use crate::builder::StructureBuilder;
use crate::change::{Change, StructureChange};
use crate::comparator::Comparator;
use crate::dialect::{Dialect, EngineVersion};
use crate::error::{ReconcileError, Result};
use crate::history::{normalize_migration_id, HistorySource};
use crate::schema::Structure;

/// Changes of one migration, keyed by table name, each list oldest first.
pub type ChangeSet = HashMap<String, Vec<StructureChange>>;

/// Hints handed through to a [`ChangeExtractor`].
#[derive(Debug, Clone, Default)]
pub struct ExtractorContext {
    /// Directories migrations are looked up in.
    pub search_paths: Vec<PathBuf>,
    /// Target dialect.
    pub dialect: Dialect,
}

/// Extracts the structure changes a migration performs.
pub trait ChangeExtractor {
    /// Returns the changes of `migration`, or `None` if it is unknown.
    fn changes_for(&self, migration: &str, context: &ExtractorContext) -> Result<Option<ChangeSet>>;
}

impl ChangeExtractor for HashMap<String, ChangeSet> {
    fn changes_for(&self, migration: &str, _context: &ExtractorContext) -> Result<Option<ChangeSet>> {
        Ok(self.get(migration).cloned())
    }
}

/// Settings of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Target dialect.
    pub dialect: Dialect,
    /// Database engine version, if known.
    pub engine_version: Option<EngineVersion>,
    /// Describe differences only, never fail on unsupported operations.
    pub only_show: bool,
    /// Migrations to leave out of the history walk.
    pub skip: Vec<String>,
    /// Directories migrations are looked up in.
    pub search_paths: Vec<PathBuf>,
}

impl ReconcileOptions {
    /// Creates options for `dialect`.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Sets the engine version.
    #[must_use]
    pub fn engine_version(mut self, version: impl Into<EngineVersion>) -> Self {
        self.engine_version = Some(version.into());
        self
    }

    /// Sets show-only mode.
    #[must_use]
    pub fn only_show(mut self, only_show: bool) -> Self {
        self.only_show = only_show;
        self
    }

    /// Adds a migration to skip.
    #[must_use]
    pub fn skip(mut self, migration: impl Into<String>) -> Self {
        self.skip.push(migration.into());
        self
    }

    /// Adds a migration search path.
    #[must_use]
    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }
}

/// How scanning one migration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Keep walking older migrations.
    Continue,
    /// The table was created here; stop and keep what was gathered.
    Created,
    /// The table was dropped here; stop and discard what was gathered.
    Dropped,
}

/// Result of inspecting a batch of tables.
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Table order and postponed foreign keys.
    pub arrangement: Arrangement,
    /// One blueprint per table, in arranged order.
    pub blueprints: Vec<Blueprint>,
}

/// Reconciles live tables with their migration history.
#[derive(Debug)]
pub struct Inspector<'a, H: ?Sized, E: ?Sized> {
    history: &'a H,
    extractor: &'a E,
    options: ReconcileOptions,
}

impl<'a, H, E> Inspector<'a, H, E>
where
    H: HistorySource + ?Sized,
    E: ChangeExtractor + ?Sized,
{
    /// Creates an inspector over a history source and a change extractor.
    pub fn new(history: &'a H, extractor: &'a E, options: ReconcileOptions) -> Self {
        Self {
            history,
            extractor,
            options,
        }
    }

    /// Returns the run settings.
    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Builds the blueprint bringing the migrations of `live` up to date.
    ///
    /// # Errors
    ///
    /// Fails when a collaborator fails, when a recorded change cannot be
    /// replayed, or (in apply mode) when the dialect cannot express a needed
    /// change.
    pub fn prepare_blueprint(&self, live: &Structure) -> Result<Blueprint> {
        let mut blueprint = Blueprint::new(live.name.clone());

        let changes = self.gather_changes(&live.name)?;
        if changes.is_empty() {
            info!(table = %live.name, "No recorded changes, starting from scratch");
            blueprint.start_from_scratch();
            return Ok(blueprint);
        }

        debug!(table = %live.name, changes = changes.len(), "Replaying recorded changes");
        let recorded = StructureBuilder::build(live.name.clone(), &changes, self.options.dialect)?;

        Comparator::new(self.options.dialect, self.options.engine_version.clone())
            .only_show(self.options.only_show)
            .compare(live, &recorded, &mut blueprint)?;
        Ok(blueprint)
    }

    /// Collects the recorded changes of `table`, oldest first.
    ///
    /// An empty result means the table has to be generated from scratch.
    pub fn gather_changes(&self, table: &str) -> Result<Vec<StructureChange>> {
        let history = self.history.fetch_history()?;
        let skip: HashSet<&str> = self
            .options
            .skip
            .iter()
            .map(|m| normalize_migration_id(m))
            .collect();
        let context = ExtractorContext {
            search_paths: self.options.search_paths.clone(),
            dialect: self.options.dialect,
        };

        let mut tracked = table.to_string();
        let mut gathered = Vec::new();

        for entry in &history {
            if skip.contains(normalize_migration_id(&entry.migration)) {
                debug!(migration = %entry.migration, "Skipping migration");
                continue;
            }
            let Some(changes) = self.extractor.changes_for(&entry.migration, &context)? else {
                continue;
            };

            match scan_migration(&changes, &mut tracked, &mut gathered) {
                Scan::Continue => {}
                Scan::Created => {
                    debug!(table = %tracked, migration = %entry.migration, "Found table creation");
                    break;
                }
                Scan::Dropped => {
                    debug!(table = %tracked, migration = %entry.migration, "Found table drop");
                    gathered.clear();
                    break;
                }
            }
        }

        gathered.reverse();
        Ok(gathered)
    }

    /// Arranges `tables` and prepares a blueprint for each, in order.
    ///
    /// # Errors
    ///
    /// Fails with [`ReconcileError::StructureUnavailable`] if a table has no
    /// live structure, or with any error [`Self::prepare_blueprint`] raises.
    pub fn inspect_all<P, S>(&self, provider: &P, tables: &[S]) -> Result<Inspection>
    where
        P: StructureProvider + ?Sized,
        S: AsRef<str>,
    {
        let arrangement = Arranger::new(provider).arrange(tables)?;
        let mut blueprints = Vec::with_capacity(arrangement.tables_in_order.len());
        for table in &arrangement.tables_in_order {
            let live = provider
                .structure_of(table)?
                .ok_or_else(|| ReconcileError::StructureUnavailable(table.clone()))?;
            blueprints.push(self.prepare_blueprint(&live)?);
        }
        Ok(Inspection {
            arrangement,
            blueprints,
        })
    }
}

/// Scans one migration newest change first for the tracked table.
///
/// A rename switches the tracked name to the earlier one and rescans the
/// same migration.
fn scan_migration(changes: &ChangeSet, tracked: &mut String, gathered: &mut Vec<StructureChange>) -> Scan {
    let mut visited: HashSet<String> = HashSet::new();

    'rescan: while visited.insert(tracked.clone()) {
        let Some(list) = changes.get(tracked.as_str()) else {
            return Scan::Continue;
        };

        for change in list.iter().rev() {
            match change.value() {
                Change::DropTable => return Scan::Dropped,
                Change::RenameTable(previous) => {
                    debug!(table = %tracked, previous = %previous, "Following table rename");
                    tracked.clone_from(previous);
                    continue 'rescan;
                }
                Change::CreateTable(_) => {
                    gathered.push(change.clone());
                    return Scan::Created;
                }
                _ => gathered.push(change.clone()),
            }
        }
        return Scan::Continue;
    }

    Scan::Continue
}
