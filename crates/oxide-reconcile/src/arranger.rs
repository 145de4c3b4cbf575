//! Table ordering by foreign-key dependency.
//!
//! Tables must be created after the tables their foreign keys reference.
//! When references form a cycle, some foreign keys cannot be created together
//! with their table; those edges are cut and reported as postponed so they
//! can be added once every table exists.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::schema::Structure;

/// Source of live table structures.
pub trait StructureProvider {
    /// Returns the live structure of `table`, or `None` if it does not exist.
    fn structure_of(&self, table: &str) -> Result<Option<Structure>>;
}

impl StructureProvider for Vec<Structure> {
    fn structure_of(&self, table: &str) -> Result<Option<Structure>> {
        Ok(self.iter().find(|s| s.name == table).cloned())
    }
}

/// A foreign-key dependency that was cut to break a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostponedReference {
    /// Table holding the foreign key.
    pub table: String,
    /// Table the foreign key references.
    pub referenced_table: String,
}

/// Result of arranging a batch of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrangement {
    /// Every input table exactly once, dependencies first.
    pub tables_in_order: Vec<String>,
    /// Cut dependency edges, in the order they were cut.
    pub postponed: Vec<PostponedReference>,
}

impl Arrangement {
    /// Returns the referenced tables whose foreign keys must be added after
    /// all tables are created, deduplicated in cut order.
    #[must_use]
    pub fn references_to_postpone(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.postponed
            .iter()
            .map(|p| p.referenced_table.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Returns `true` if a foreign key from `table` to `referenced_table`
    /// has to be postponed.
    #[must_use]
    pub fn is_postponed(&self, table: &str, referenced_table: &str) -> bool {
        self.postponed
            .iter()
            .any(|p| p.table == table && p.referenced_table == referenced_table)
    }
}

/// Orders tables for creation.
#[derive(Debug)]
pub struct Arranger<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: StructureProvider + ?Sized> Arranger<'a, P> {
    /// Creates an arranger reading foreign keys from `provider`.
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Arranges `tables` by foreign-key dependency.
    ///
    /// Tables unknown to the provider have no dependencies. References to
    /// tables outside the batch are not dependencies.
    pub fn arrange<S: AsRef<str>>(&self, tables: &[S]) -> Result<Arrangement> {
        let mut dependencies: Vec<(String, Vec<String>)> = Vec::with_capacity(tables.len());
        for table in tables {
            let table = table.as_ref();
            if dependencies.iter().any(|(name, _)| name == table) {
                continue;
            }
            let referenced = match self.provider.structure_of(table)? {
                Some(structure) => structure
                    .foreign_keys
                    .into_iter()
                    .map(|fk| fk.referenced_table)
                    .collect(),
                None => Vec::new(),
            };
            dependencies.push((table.to_string(), referenced));
        }
        Ok(arrange_dependencies(dependencies))
    }
}

/// Arranges an explicit dependency map, given as `(table, referenced tables)`
/// pairs in input order.
#[must_use]
pub fn arrange_dependencies(dependencies: Vec<(String, Vec<String>)>) -> Arrangement {
    let known: HashSet<String> = dependencies.iter().map(|(t, _)| t.clone()).collect();
    let mut postponed: Vec<PostponedReference> = Vec::new();

    let mut graph: Vec<(String, Vec<String>)> = Vec::with_capacity(dependencies.len());
    for (table, referenced) in dependencies {
        if graph.iter().any(|(name, _)| *name == table) {
            continue;
        }
        let mut edges: Vec<String> = Vec::new();
        for dependency in referenced {
            if !known.contains(&dependency) || edges.contains(&dependency) {
                continue;
            }
            if dependency == table {
                debug!(table = %table, "Postponing self-reference");
                push_postponed(&mut postponed, &table, &dependency);
                continue;
            }
            edges.push(dependency);
        }
        graph.push((table, edges));
    }

    loop {
        match resolve_order(&graph) {
            Ok(tables_in_order) => {
                return Arrangement {
                    tables_in_order,
                    postponed,
                };
            }
            Err((table_idx, edge_idx)) => {
                let (table, edges) = &mut graph[table_idx];
                let dependency = edges.remove(edge_idx);
                debug!(
                    table = %table,
                    referenced = %dependency,
                    "Cutting foreign-key cycle"
                );
                push_postponed(&mut postponed, table, &dependency);
            }
        }
    }
}

fn push_postponed(postponed: &mut Vec<PostponedReference>, table: &str, referenced: &str) {
    let reference = PostponedReference {
        table: table.to_string(),
        referenced_table: referenced.to_string(),
    };
    if !postponed.contains(&reference) {
        postponed.push(reference);
    }
}

/// Resolves the graph in scan order.
///
/// On a cycle, returns the position `(table, edge)` of the dependency edge
/// examined last in the scan that made no progress.
fn resolve_order(graph: &[(String, Vec<String>)]) -> std::result::Result<Vec<String>, (usize, usize)> {
    let mut order: Vec<String> = Vec::with_capacity(graph.len());
    let mut resolved: HashSet<&str> = HashSet::with_capacity(graph.len());

    while order.len() < graph.len() {
        let mut progress = false;
        let mut last_blocking = None;

        for (idx, (table, edges)) in graph.iter().enumerate() {
            if resolved.contains(table.as_str()) {
                continue;
            }
            match edges.iter().position(|d| !resolved.contains(d.as_str())) {
                None => {
                    resolved.insert(table.as_str());
                    order.push(table.clone());
                    progress = true;
                }
                Some(edge_idx) => last_blocking = Some((idx, edge_idx)),
            }
        }

        if !progress {
            if let Some(edge) = last_blocking {
                return Err(edge);
            }
            break;
        }
    }

    Ok(order)
}
