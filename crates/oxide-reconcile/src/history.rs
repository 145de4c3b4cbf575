//! Applied migration history.
//!
//! History is consumed newest first. Entries applied in the same second are
//! ordered by the timestamp embedded in the migration name
//! (`m240101_120000_create_users` or the namespaced `M240101120000CreateUsers`),
//! then by name.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Migration identifier, possibly namespaced.
    pub migration: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates a history entry.
    #[must_use]
    pub fn new(migration: impl Into<String>, applied_at: DateTime<Utc>) -> Self {
        Self {
            migration: migration.into(),
            applied_at,
        }
    }

    /// Returns the timestamp embedded in the migration name.
    #[must_use]
    pub fn canonical_timestamp(&self) -> Option<NaiveDateTime> {
        canonical_timestamp(&self.migration)
    }
}

/// Source of the applied migration history.
pub trait HistorySource {
    /// Returns the applied migrations, newest first.
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>>;
}

impl HistorySource for Vec<HistoryEntry> {
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut history = self.clone();
        sort_history(&mut history);
        Ok(history)
    }
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|\\)[mM](\d{6})_?(\d{6})").expect("valid regex"))
}

/// Parses the `YYMMDD_HHMMSS` timestamp out of a migration name.
#[must_use]
pub fn canonical_timestamp(migration: &str) -> Option<NaiveDateTime> {
    let captures = timestamp_pattern().captures(migration)?;
    let raw = format!("{}{}", &captures[1], &captures[2]);
    NaiveDateTime::parse_from_str(&raw, "%y%m%d%H%M%S").ok()
}

/// Sorts history newest first: by application time, then embedded
/// timestamp, then name, all descending.
pub fn sort_history(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| {
        b.applied_at
            .cmp(&a.applied_at)
            .then_with(|| b.canonical_timestamp().cmp(&a.canonical_timestamp()))
            .then_with(|| b.migration.cmp(&a.migration))
    });
}

/// Trims leading and trailing namespace separators from a migration id.
#[must_use]
pub fn normalize_migration_id(migration: &str) -> &str {
    migration.trim_matches('\\')
}
