//! Structure model.
//!
//! A [`Structure`] is the in-memory schema snapshot of a single table. It is
//! produced either by a live-schema provider or by replaying recorded
//! [`StructureChange`](crate::change::StructureChange)s, and the two kinds are
//! compared by the [`Comparator`](crate::comparator::Comparator).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type tags.
///
/// Whether a type's length is meaningful depends on the dialect and the
/// engine version; see [`crate::length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    #[serde(rename = "pk")]
    PrimaryKey,
    /// Unsigned auto-incrementing integer primary key.
    #[serde(rename = "upk")]
    UnsignedPrimaryKey,
    /// Auto-incrementing big integer primary key.
    #[serde(rename = "bigpk")]
    BigPrimaryKey,
    /// Unsigned auto-incrementing big integer primary key.
    #[serde(rename = "ubigpk")]
    UnsignedBigPrimaryKey,
    /// Fixed-length character string.
    #[serde(rename = "char")]
    Char,
    /// Variable-length character string.
    #[default]
    #[serde(rename = "string")]
    String,
    /// Text.
    #[serde(rename = "text")]
    Text,
    /// Tiny integer.
    #[serde(rename = "tinyint")]
    TinyInteger,
    /// Small integer (16-bit).
    #[serde(rename = "smallint")]
    SmallInteger,
    /// Integer (32-bit).
    #[serde(rename = "integer")]
    Integer,
    /// Big integer (64-bit).
    #[serde(rename = "bigint")]
    BigInteger,
    /// Floating point (single precision).
    #[serde(rename = "float")]
    Float,
    /// Floating point (double precision).
    #[serde(rename = "double")]
    Double,
    /// Decimal with precision and scale.
    #[serde(rename = "decimal")]
    Decimal,
    /// Date and time.
    #[serde(rename = "datetime")]
    DateTime,
    /// Timestamp.
    #[serde(rename = "timestamp")]
    Timestamp,
    /// Time only.
    #[serde(rename = "time")]
    Time,
    /// Date only.
    #[serde(rename = "date")]
    Date,
    /// Binary data.
    #[serde(rename = "binary")]
    Binary,
    /// Boolean.
    #[serde(rename = "boolean")]
    Boolean,
    /// Money (decimal with fixed defaults).
    #[serde(rename = "money")]
    Money,
    /// JSON data.
    #[serde(rename = "json")]
    Json,
}

impl ColumnType {
    /// Returns the type tag as written in migrations.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryKey => "pk",
            Self::UnsignedPrimaryKey => "upk",
            Self::BigPrimaryKey => "bigpk",
            Self::UnsignedBigPrimaryKey => "ubigpk",
            Self::Char => "char",
            Self::String => "string",
            Self::Text => "text",
            Self::TinyInteger => "tinyint",
            Self::SmallInteger => "smallint",
            Self::Integer => "integer",
            Self::BigInteger => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Money => "money",
            Self::Json => "json",
        }
    }

    /// Returns `true` for the primary-key shorthand types.
    #[must_use]
    pub fn is_primary_key_type(self) -> bool {
        matches!(
            self,
            Self::PrimaryKey
                | Self::UnsignedPrimaryKey
                | Self::BigPrimaryKey
                | Self::UnsignedBigPrimaryKey
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultValue {
    /// No default value.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g., "CURRENT_TIMESTAMP").
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some("NULL".to_string()),
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sql() {
            Some(sql) => f.write_str(&sql),
            None => f.write_str("none"),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A single table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Type tag.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Size (string/binary/integer display width, temporal precision).
    pub size: Option<u32>,
    /// Numeric precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether the column has a UNIQUE constraint.
    pub unique: bool,
    /// Whether the column is unsigned.
    pub unsigned: bool,
    /// Default value.
    pub default: DefaultValue,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
    /// Dialect-specific trailing SQL, e.g. `AUTO_INCREMENT PRIMARY KEY`.
    pub append: Option<String>,
    /// Column comment.
    pub comment: Option<String>,
    /// Name of the column this one should follow.
    pub after: Option<String>,
    /// Whether this column should be placed first.
    pub first: bool,
}

impl Default for Column {
    fn default() -> Self {
        Self::new("", ColumnType::default())
    }
}

impl Column {
    /// Creates a new nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            size: None,
            precision: None,
            scale: None,
            unique: false,
            unsigned: false,
            default: DefaultValue::None,
            primary_key: false,
            auto_increment: false,
            append: None,
            comment: None,
            after: None,
            first: false,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are always NOT NULL
        self
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the column as unsigned.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// Sets the append SQL.
    #[must_use]
    pub fn append(mut self, append: impl Into<String>) -> Self {
        self.append = Some(append.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns the append SQL, empty when not set.
    #[must_use]
    pub fn append_str(&self) -> &str {
        self.append.as_deref().unwrap_or("")
    }

    /// Returns `true` if the append SQL declares this column as primary key.
    #[must_use]
    pub fn has_primary_key_info(&self) -> bool {
        crate::dialect::has_primary_key_info(self.append_str())
    }
}

/// Primary key definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrimaryKey {
    /// Constraint name, if any.
    pub name: Option<String>,
    /// Column names in key order.
    pub columns: Vec<String>,
}

impl PrimaryKey {
    /// Creates an unnamed primary key over the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns `true` if the key spans more than one column.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// Returns `true` if the key has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns `true` if `column` is part of the key.
    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Column(s) in the referencing table.
    pub columns: Vec<String>,
    /// Referenced table name.
    pub referenced_table: String,
    /// Referenced column(s).
    pub referenced_columns: Vec<String>,
    /// Action on delete.
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a foreign key without referential actions.
    #[must_use]
    pub fn new<C, R>(
        name: impl Into<String>,
        columns: C,
        referenced_table: impl Into<String>,
        referenced_columns: R,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Columns included in the index.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    /// Creates an index.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        }
    }

    /// Returns the column if this is a unique index over exactly one column.
    #[must_use]
    pub fn single_unique_column(&self) -> Option<&str> {
        match self.columns.as_slice() {
            [column] if self.unique => Some(column.as_str()),
            _ => None,
        }
    }
}

/// Schema snapshot of one table.
///
/// Columns, foreign keys and indexes keep insertion order; names are unique
/// within each collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Structure {
    /// Table name.
    pub name: String,
    /// Primary key, if any.
    pub primary_key: Option<PrimaryKey>,
    /// Columns in table order.
    pub columns: Vec<Column>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// Indexes.
    pub indexes: Vec<Index>,
}

impl Structure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a column to the table.
    ///
    /// Columns flagged as primary key are folded into the primary key.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        if column.primary_key {
            self.fold_into_primary_key(&column.name);
        }
        self.set_column(column);
        self
    }

    /// Sets the primary key.
    #[must_use]
    pub fn primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.set_foreign_key(fk);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.set_index(index);
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets a mutable column by name.
    #[must_use]
    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Inserts a column, replacing (in place) any column with the same name.
    pub fn set_column(&mut self, column: Column) {
        match self.get_column_mut(&column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Removes a column by name.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Appends `column` to the primary key, creating it if necessary.
    pub fn fold_into_primary_key(&mut self, column: &str) {
        match &mut self.primary_key {
            Some(pk) if !pk.contains(column) => pk.columns.push(column.to_string()),
            Some(_) => {}
            None => self.primary_key = Some(PrimaryKey::new([column])),
        }
    }

    /// Gets a foreign key by name.
    #[must_use]
    pub fn get_foreign_key(&self, name: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.name == name)
    }

    /// Inserts a foreign key, replacing any with the same name.
    pub fn set_foreign_key(&mut self, fk: ForeignKey) {
        match self.foreign_keys.iter_mut().find(|f| f.name == fk.name) {
            Some(existing) => *existing = fk,
            None => self.foreign_keys.push(fk),
        }
    }

    /// Removes a foreign key by name.
    pub fn remove_foreign_key(&mut self, name: &str) -> Option<ForeignKey> {
        let idx = self.foreign_keys.iter().position(|fk| fk.name == name)?;
        Some(self.foreign_keys.remove(idx))
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Inserts an index, replacing any with the same name.
    pub fn set_index(&mut self, index: Index) {
        match self.indexes.iter_mut().find(|i| i.name == index.name) {
            Some(existing) => *existing = index,
            None => self.indexes.push(index),
        }
    }

    /// Removes an index by name.
    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        let idx = self.indexes.iter().position(|i| i.name == name)?;
        Some(self.indexes.remove(idx))
    }

    /// Returns the primary key column names (empty when there is no key).
    #[must_use]
    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key
            .as_ref()
            .map_or(&[][..], |pk| pk.columns.as_slice())
    }

    /// Returns column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
