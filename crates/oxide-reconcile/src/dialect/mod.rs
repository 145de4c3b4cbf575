//! Database dialects and their structural capabilities.
//!
//! A dialect decides two things for the engine: which structural operations
//! can be expressed at all (SQLite cannot alter or drop columns, nor change
//! keys after table creation), and how primary-key and auto-increment
//! information is embedded in a column's trailing "append" SQL.

mod append;

pub use append::{
    has_primary_key_info, primary_key_append, strip_key_markers, strip_primary_key_info,
    StrippedAppend,
};

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Target database engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL and MariaDB.
    #[default]
    Mysql,
    /// PostgreSQL.
    Pgsql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    Mssql,
    /// Oracle.
    Oci,
    /// CUBRID.
    Cubrid,
}

/// Structural operations whose availability depends on the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaOperation {
    /// `ADD COLUMN`.
    AddColumn,
    /// `ALTER COLUMN`.
    AlterColumn,
    /// `DROP COLUMN`.
    DropColumn,
    /// `ADD FOREIGN KEY`.
    AddForeignKey,
    /// `DROP FOREIGN KEY`.
    DropForeignKey,
    /// `ADD PRIMARY KEY`.
    AddPrimaryKey,
    /// `DROP PRIMARY KEY`.
    DropPrimaryKey,
    /// `CREATE INDEX`.
    CreateIndex,
    /// `DROP INDEX`.
    DropIndex,
}

impl SchemaOperation {
    /// Returns the SQL phrase naming this operation.
    #[must_use]
    pub fn sql_name(self) -> &'static str {
        match self {
            Self::AddColumn => "ADD COLUMN",
            Self::AlterColumn => "ALTER COLUMN",
            Self::DropColumn => "DROP COLUMN",
            Self::AddForeignKey => "ADD FOREIGN KEY",
            Self::DropForeignKey => "DROP FOREIGN KEY",
            Self::AddPrimaryKey => "ADD PRIMARY KEY",
            Self::DropPrimaryKey => "DROP PRIMARY KEY",
            Self::CreateIndex => "CREATE INDEX",
            Self::DropIndex => "DROP INDEX",
        }
    }
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Self; 6] = [
        Self::Mysql,
        Self::Pgsql,
        Self::Sqlite,
        Self::Mssql,
        Self::Oci,
        Self::Cubrid,
    ];

    /// Returns the dialect name used in messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mysql => "MySQL",
            Self::Pgsql => "PostgreSQL",
            Self::Sqlite => "SQLite",
            Self::Mssql => "MSSQL",
            Self::Oci => "Oracle",
            Self::Cubrid => "CUBRID",
        }
    }

    /// Returns whether this dialect can express the given operation on an
    /// existing table.
    #[must_use]
    pub fn supports(self, operation: SchemaOperation) -> bool {
        match self {
            Self::Sqlite => matches!(
                operation,
                SchemaOperation::AddColumn
                    | SchemaOperation::CreateIndex
                    | SchemaOperation::DropIndex
            ),
            _ => true,
        }
    }

    /// Returns the keyword marking an auto-incrementing column, if the
    /// dialect expresses it in column append SQL.
    #[must_use]
    pub fn auto_increment_keyword(self) -> Option<&'static str> {
        match self {
            Self::Mysql | Self::Cubrid => Some("AUTO_INCREMENT"),
            Self::Sqlite => Some("AUTOINCREMENT"),
            Self::Mssql => Some("IDENTITY"),
            Self::Pgsql | Self::Oci => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Dialect {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Pgsql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mssql" | "sqlsrv" | "dblib" => Ok(Self::Mssql),
            "oci" | "oracle" => Ok(Self::Oci),
            "cubrid" => Ok(Self::Cubrid),
            other => Err(ReconcileError::UnknownDialect(other.to_string())),
        }
    }
}

/// Database engine version, compared numerically component by component.
///
/// Vendor suffixes are ignored, so `8.0.17-log` equals `8.0.17`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EngineVersion {
    raw: String,
    parts: Vec<u32>,
}

impl EngineVersion {
    /// Parses a dotted version string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut parts = Vec::new();
        for segment in raw.trim().split('.') {
            let digits: String = segment.chars().take_while(char::is_ascii_digit).collect();
            match digits.parse::<u32>() {
                Ok(n) => parts.push(n),
                Err(_) => break,
            }
            if digits.len() != segment.len() {
                break;
            }
        }
        Self { raw, parts }
    }

    /// Returns the version as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if this version is at least `other`.
    #[must_use]
    pub fn at_least(&self, other: &str) -> bool {
        *self >= Self::new(other)
    }

    /// Returns `true` if this version is below `other`.
    #[must_use]
    pub fn below(&self, other: &str) -> bool {
        *self < Self::new(other)
    }
}

impl PartialEq for EngineVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EngineVersion {}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl From<String> for EngineVersion {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for EngineVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<EngineVersion> for String {
    fn from(version: EngineVersion) -> Self {
        version.raw
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
