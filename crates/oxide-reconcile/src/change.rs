//! Structure changes.
//!
//! A [`StructureChange`] is one atomic mutation of a table recorded in a
//! migration. Extractors hand them over in raw form (`table`, `method`,
//! untyped `value`); [`StructureChange::decode`] checks the payload against
//! the method once, so every consumer works with typed values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReconcileError, Result};
use crate::schema::{Column, ForeignKey, Index, PrimaryKey};

/// Method tags of recorded changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeMethod {
    /// `createTable`.
    CreateTable,
    /// `dropTable`, only meaningful while walking history.
    DropTable,
    /// `renameTable`, only meaningful while walking history.
    RenameTable,
    /// `addColumn`.
    AddColumn,
    /// `alterColumn`.
    AlterColumn,
    /// `dropColumn`.
    DropColumn,
    /// `renameColumn`.
    RenameColumn,
    /// `addPrimaryKey`.
    AddPrimaryKey,
    /// `dropPrimaryKey`.
    DropPrimaryKey,
    /// `addForeignKey`.
    AddForeignKey,
    /// `dropForeignKey`.
    DropForeignKey,
    /// `createIndex`.
    CreateIndex,
    /// `dropIndex`.
    DropIndex,
    /// `addCommentOnColumn`.
    AddCommentOnColumn,
    /// `dropCommentFromColumn`.
    DropCommentFromColumn,
}

impl ChangeMethod {
    /// All method tags.
    pub const ALL: [Self; 15] = [
        Self::CreateTable,
        Self::DropTable,
        Self::RenameTable,
        Self::AddColumn,
        Self::AlterColumn,
        Self::DropColumn,
        Self::RenameColumn,
        Self::AddPrimaryKey,
        Self::DropPrimaryKey,
        Self::AddForeignKey,
        Self::DropForeignKey,
        Self::CreateIndex,
        Self::DropIndex,
        Self::AddCommentOnColumn,
        Self::DropCommentFromColumn,
    ];

    /// Returns the tag as written by extractors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateTable => "createTable",
            Self::DropTable => "dropTable",
            Self::RenameTable => "renameTable",
            Self::AddColumn => "addColumn",
            Self::AlterColumn => "alterColumn",
            Self::DropColumn => "dropColumn",
            Self::RenameColumn => "renameColumn",
            Self::AddPrimaryKey => "addPrimaryKey",
            Self::DropPrimaryKey => "dropPrimaryKey",
            Self::AddForeignKey => "addForeignKey",
            Self::DropForeignKey => "dropForeignKey",
            Self::CreateIndex => "createIndex",
            Self::DropIndex => "dropIndex",
            Self::AddCommentOnColumn => "addCommentOnColumn",
            Self::DropCommentFromColumn => "dropCommentFromColumn",
        }
    }
}

impl fmt::Display for ChangeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeMethod {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ReconcileError::Configuration(format!("unknown change method '{s}'")))
    }
}

/// Payload of `renameColumn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Name before the rename.
    pub old: String,
    /// Name after the rename.
    pub new: String,
}

/// Payload of `addCommentOnColumn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnComment {
    /// Column name.
    pub column: String,
    /// Comment text.
    pub comment: String,
}

/// A typed change, one variant per method.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Table created with the given columns.
    CreateTable(Vec<Column>),
    /// Table dropped.
    DropTable,
    /// Table renamed; holds the name the table had before.
    RenameTable(String),
    /// Column added.
    AddColumn(Column),
    /// Column redefined.
    AlterColumn(Column),
    /// Column dropped (by name).
    DropColumn(String),
    /// Column renamed.
    RenameColumn(ColumnRename),
    /// Primary key added.
    AddPrimaryKey(PrimaryKey),
    /// Primary key dropped; holds the constraint name if recorded.
    DropPrimaryKey(Option<String>),
    /// Foreign key added.
    AddForeignKey(ForeignKey),
    /// Foreign key dropped (by name).
    DropForeignKey(String),
    /// Index created.
    CreateIndex(Index),
    /// Index dropped (by name).
    DropIndex(String),
    /// Comment set on a column.
    AddCommentOnColumn(ColumnComment),
    /// Comment removed from a column (by column name).
    DropCommentFromColumn(String),
}

impl Change {
    /// Returns the method tag of this change.
    #[must_use]
    pub fn method(&self) -> ChangeMethod {
        match self {
            Self::CreateTable(_) => ChangeMethod::CreateTable,
            Self::DropTable => ChangeMethod::DropTable,
            Self::RenameTable(_) => ChangeMethod::RenameTable,
            Self::AddColumn(_) => ChangeMethod::AddColumn,
            Self::AlterColumn(_) => ChangeMethod::AlterColumn,
            Self::DropColumn(_) => ChangeMethod::DropColumn,
            Self::RenameColumn(_) => ChangeMethod::RenameColumn,
            Self::AddPrimaryKey(_) => ChangeMethod::AddPrimaryKey,
            Self::DropPrimaryKey(_) => ChangeMethod::DropPrimaryKey,
            Self::AddForeignKey(_) => ChangeMethod::AddForeignKey,
            Self::DropForeignKey(_) => ChangeMethod::DropForeignKey,
            Self::CreateIndex(_) => ChangeMethod::CreateIndex,
            Self::DropIndex(_) => ChangeMethod::DropIndex,
            Self::AddCommentOnColumn(_) => ChangeMethod::AddCommentOnColumn,
            Self::DropCommentFromColumn(_) => ChangeMethod::DropCommentFromColumn,
        }
    }

    fn payload(&self) -> Result<Value> {
        let value = match self {
            Self::CreateTable(columns) => serde_json::to_value(columns)?,
            Self::DropTable => Value::Null,
            Self::RenameTable(name)
            | Self::DropColumn(name)
            | Self::DropForeignKey(name)
            | Self::DropIndex(name)
            | Self::DropCommentFromColumn(name) => Value::String(name.clone()),
            Self::AddColumn(column) | Self::AlterColumn(column) => serde_json::to_value(column)?,
            Self::RenameColumn(rename) => serde_json::to_value(rename)?,
            Self::AddPrimaryKey(pk) => serde_json::to_value(pk)?,
            Self::DropPrimaryKey(name) => serde_json::to_value(name)?,
            Self::AddForeignKey(fk) => serde_json::to_value(fk)?,
            Self::CreateIndex(index) => serde_json::to_value(index)?,
            Self::AddCommentOnColumn(comment) => serde_json::to_value(comment)?,
        };
        Ok(value)
    }
}

/// A change as delivered by an extractor, before payload validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStructureChange {
    /// Table the change applies to.
    pub table: String,
    /// Method tag.
    pub method: String,
    /// Method-specific payload.
    #[serde(default)]
    pub value: Value,
}

/// One atomic, method-tagged mutation of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureChange {
    table: String,
    change: Change,
}

impl StructureChange {
    /// Creates a change for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>, change: Change) -> Self {
        Self {
            table: table.into(),
            change,
        }
    }

    /// Decodes a raw change, checking the payload against the method.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Configuration`] if the method is unknown or
    /// the payload does not have the shape the method expects.
    pub fn decode(table: impl Into<String>, method: &str, value: Value) -> Result<Self> {
        let table = table.into();
        let method: ChangeMethod = method.parse()?;
        let change = decode_payload(method, value).map_err(|e| {
            ReconcileError::Configuration(format!(
                "payload of '{method}' for table '{table}' does not match: {e}"
            ))
        })?;
        Ok(Self { table, change })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the method tag.
    #[must_use]
    pub fn method(&self) -> ChangeMethod {
        self.change.method()
    }

    /// Returns the typed payload.
    #[must_use]
    pub fn value(&self) -> &Change {
        &self.change
    }

    /// Converts back into the raw extractor form.
    pub fn to_raw(&self) -> Result<RawStructureChange> {
        Ok(RawStructureChange {
            table: self.table.clone(),
            method: self.method().as_str().to_string(),
            value: self.change.payload()?,
        })
    }
}

impl TryFrom<RawStructureChange> for StructureChange {
    type Error = ReconcileError;

    fn try_from(raw: RawStructureChange) -> Result<Self> {
        Self::decode(raw.table, &raw.method, raw.value)
    }
}

fn decode_payload(method: ChangeMethod, value: Value) -> std::result::Result<Change, String> {
    fn typed<T: serde::de::DeserializeOwned>(value: Value) -> std::result::Result<T, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    fn named_column(column: Column) -> std::result::Result<Column, String> {
        if column.name.is_empty() {
            return Err("column without a name".to_string());
        }
        Ok(column)
    }

    fn name(value: Value) -> std::result::Result<String, String> {
        match value {
            Value::String(s) if !s.is_empty() => Ok(s),
            other => Err(format!("expected a non-empty name, got {other}")),
        }
    }

    let change = match method {
        ChangeMethod::CreateTable => {
            let columns: Vec<Column> = typed(value)?;
            Change::CreateTable(
                columns
                    .into_iter()
                    .map(named_column)
                    .collect::<std::result::Result<_, _>>()?,
            )
        }
        ChangeMethod::DropTable => Change::DropTable,
        ChangeMethod::RenameTable => Change::RenameTable(name(value)?),
        ChangeMethod::AddColumn => Change::AddColumn(named_column(typed(value)?)?),
        ChangeMethod::AlterColumn => Change::AlterColumn(named_column(typed(value)?)?),
        ChangeMethod::DropColumn => Change::DropColumn(name(value)?),
        ChangeMethod::RenameColumn => Change::RenameColumn(typed(value)?),
        ChangeMethod::AddPrimaryKey => Change::AddPrimaryKey(typed(value)?),
        ChangeMethod::DropPrimaryKey => Change::DropPrimaryKey(typed(value)?),
        ChangeMethod::AddForeignKey => Change::AddForeignKey(typed(value)?),
        ChangeMethod::DropForeignKey => Change::DropForeignKey(name(value)?),
        ChangeMethod::CreateIndex => Change::CreateIndex(typed(value)?),
        ChangeMethod::DropIndex => Change::DropIndex(name(value)?),
        ChangeMethod::AddCommentOnColumn => Change::AddCommentOnColumn(typed(value)?),
        ChangeMethod::DropCommentFromColumn => Change::DropCommentFromColumn(name(value)?),
    };
    Ok(change)
}
