//! Schema reconciliation for migration-managed databases.
//!
//! `oxide-reconcile` checks whether the tables of a live database still match
//! what their recorded migrations describe, and works out what a new
//! migration would have to do when they do not:
//! - Tables are ordered by foreign-key dependency, cutting cycles
//! - Recorded changes are replayed into the structure the migrations expect
//! - The live and replayed structures are diffed, honoring dialect limits
//!
//! # Architecture
//!
//! - **Arranger** - Orders tables for creation, postponing cyclic foreign keys
//! - **Builder** - Replays recorded changes onto an empty structure
//! - **Inspector** - Walks migration history and drives builder and comparator
//! - **Comparator** - Diffs two structures into a blueprint
//! - **Blueprint** - Renderer-agnostic change set of one table
//!
//! Live structures, history and migration changes come from collaborators
//! behind the [`StructureProvider`](arranger::StructureProvider),
//! [`HistorySource`](history::HistorySource) and
//! [`ChangeExtractor`](inspector::ChangeExtractor) traits.
//!
//! # Example
//!
//! ```rust
//! use oxide_reconcile::prelude::*;
//!
//! let recorded = vec![
//!     StructureChange::new(
//!         "users",
//!         Change::CreateTable(vec![Column::new("id", ColumnType::Integer).primary_key()]),
//!     ),
//! ];
//! let old = StructureBuilder::build("users", &recorded, Dialect::Pgsql).unwrap();
//!
//! let live = Structure::new("users")
//!     .column(Column::new("id", ColumnType::Integer).primary_key())
//!     .column(Column::new("email", ColumnType::String).size(255));
//!
//! let blueprint = Comparator::new(Dialect::Pgsql, None).diff(&live, &old).unwrap();
//! assert_eq!(blueprint.descriptions(), ["missing column 'email'"]);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Order the tables of a snapshot
//! oxide-reconcile --snapshot db.json arrange
//!
//! # Describe what a migration for `users` would have to change
//! oxide-reconcile --snapshot db.json --dialect sqlite inspect users --show
//! ```

pub mod arranger;
pub mod blueprint;
pub mod builder;
pub mod change;
pub mod comparator;
pub mod dialect;
pub mod error;
pub mod fixture;
pub mod history;
pub mod inspector;
pub mod length;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::arranger::{arrange_dependencies, Arrangement, Arranger, PostponedReference, StructureProvider};
    pub use crate::blueprint::Blueprint;
    pub use crate::builder::StructureBuilder;
    pub use crate::change::{
        Change, ChangeMethod, ColumnComment, ColumnRename, RawStructureChange, StructureChange,
    };
    pub use crate::comparator::Comparator;
    pub use crate::dialect::{Dialect, EngineVersion, SchemaOperation};
    pub use crate::error::{ReconcileError, Result};
    pub use crate::fixture::Snapshot;
    pub use crate::history::{HistoryEntry, HistorySource};
    pub use crate::inspector::{
        ChangeExtractor, ChangeSet, ExtractorContext, Inspection, Inspector, ReconcileOptions,
    };
    pub use crate::schema::{
        Column, ColumnType, DefaultValue, ForeignKey, ForeignKeyAction, Index, PrimaryKey, Structure,
    };
}
