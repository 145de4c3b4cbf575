//! Column length rules.
//!
//! Whether a column's length takes part in comparisons depends on the type,
//! the dialect and sometimes the engine version (MySQL dropped integer display
//! widths in 8.0.17 and only supports fractional seconds since 5.6.4). The
//! rules live in one lookup table instead of per-type logic.

use crate::dialect::{Dialect, EngineVersion};
use crate::schema::{Column, ColumnType};

/// How the length of a `(type, dialect)` pair is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    /// Length carries no meaning.
    Ignored,
    /// The column size is meaningful.
    Size,
    /// The column size is meaningful on engines older than the version.
    SizeBelow(&'static str),
    /// The column size is meaningful from the version on.
    SizeFrom(&'static str),
    /// Precision and scale are meaningful (`"p,s"`).
    PrecisionScale,
}

/// Looks up the length rule for a column type on a dialect.
#[must_use]
pub fn length_rule(column_type: ColumnType, dialect: Dialect) -> LengthRule {
    use ColumnType as T;
    use Dialect as D;

    match (column_type, dialect) {
        (
            T::PrimaryKey
            | T::UnsignedPrimaryKey
            | T::BigPrimaryKey
            | T::UnsignedBigPrimaryKey
            | T::TinyInteger
            | T::SmallInteger
            | T::Integer
            | T::BigInteger,
            D::Mysql,
        ) => LengthRule::SizeBelow("8.0.17"),
        (
            T::PrimaryKey
            | T::UnsignedPrimaryKey
            | T::BigPrimaryKey
            | T::UnsignedBigPrimaryKey
            | T::TinyInteger
            | T::SmallInteger
            | T::Integer
            | T::BigInteger,
            D::Oci,
        )
        | (T::Char | T::String, _)
        | (T::Binary, D::Mysql | D::Mssql)
        | (T::Float | T::Double, D::Mysql | D::Cubrid | D::Oci)
        | (T::DateTime | T::Timestamp | T::Time, D::Pgsql) => LengthRule::Size,
        (T::DateTime | T::Timestamp | T::Time, D::Mysql) => LengthRule::SizeFrom("5.6.4"),
        (T::Decimal | T::Money, _) => LengthRule::PrecisionScale,
        _ => LengthRule::Ignored,
    }
}

impl LengthRule {
    /// Returns `true` if the rule applies to the given engine version.
    ///
    /// An unknown version counts as applicable.
    #[must_use]
    pub fn applies(self, version: Option<&EngineVersion>) -> bool {
        match self {
            Self::Ignored => false,
            Self::Size | Self::PrecisionScale => true,
            Self::SizeBelow(limit) => version.map_or(true, |v| v.below(limit)),
            Self::SizeFrom(limit) => version.map_or(true, |v| v.at_least(limit)),
        }
    }
}

impl Column {
    /// Returns the column length as compared for `dialect`, or `None` when
    /// the length is not meaningful there.
    #[must_use]
    pub fn length(&self, dialect: Dialect, version: Option<&EngineVersion>) -> Option<String> {
        let rule = length_rule(self.column_type, dialect);
        if !rule.applies(version) {
            return None;
        }
        match rule {
            LengthRule::PrecisionScale => self.precision.map(|p| match self.scale {
                Some(s) => format!("{p},{s}"),
                None => p.to_string(),
            }),
            _ => self.size.map(|s| s.to_string()),
        }
    }
}

/// Compares two lengths of the same column type.
///
/// Precision/scale lengths treat a missing scale as zero, so `"10,0"` equals
/// `"10"`.
#[must_use]
pub fn lengths_match(column_type: ColumnType, new: Option<&str>, old: Option<&str>) -> bool {
    if !matches!(column_type, ColumnType::Decimal | ColumnType::Money) {
        return new.map(str::trim) == old.map(str::trim);
    }
    let normalize = |length: Option<&str>| {
        length
            .and_then(|l| parse_length(l).ok())
            .map(|(precision, scale)| (precision, scale.unwrap_or(0)))
    };
    match (new, old) {
        (None, None) => true,
        (Some(n), Some(o)) => match (normalize(Some(n)), normalize(Some(o))) {
            (Some(a), Some(b)) => a == b,
            _ => n.trim() == o.trim(),
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_normalization() {
        assert!(lengths_match(ColumnType::Decimal, Some("10,0"), Some("10")));
        assert!(lengths_match(ColumnType::Decimal, Some("9"), Some("9,0")));
        assert!(lengths_match(ColumnType::Money, Some("19, 4"), Some("19,4")));
        assert!(!lengths_match(ColumnType::Decimal, Some("10,2"), Some("10")));
        assert!(!lengths_match(ColumnType::Decimal, Some("10"), None));
    }

    #[test]
    fn test_non_decimal_lengths_compare_verbatim() {
        assert!(lengths_match(ColumnType::String, Some("255"), Some("255")));
        assert!(!lengths_match(ColumnType::String, Some("10,0"), Some("10")));
        assert!(lengths_match(ColumnType::Text, None, None));
    }

    #[test]
    fn test_integer_display_width_depends_on_engine_version() {
        let column = Column::new("id", ColumnType::Integer).size(11);

        let old_mysql = EngineVersion::new("5.7.30");
        let new_mysql = EngineVersion::new("8.0.17");
        assert_eq!(
            column.length(Dialect::Mysql, Some(&old_mysql)).as_deref(),
            Some("11")
        );
        assert_eq!(column.length(Dialect::Mysql, Some(&new_mysql)), None);
        assert_eq!(column.length(Dialect::Pgsql, None), None);
        assert_eq!(column.length(Dialect::Oci, None).as_deref(), Some("11"));
    }

    #[test]
    fn test_timestamp_precision_depends_on_engine_version() {
        let column = Column::new("created_at", ColumnType::Timestamp).size(3);

        assert_eq!(
            column
                .length(Dialect::Mysql, Some(&EngineVersion::new("5.6.3")))
                .as_deref(),
            None
        );
        assert_eq!(
            column
                .length(Dialect::Mysql, Some(&EngineVersion::new("5.6.4")))
                .as_deref(),
            Some("3")
        );
        assert_eq!(column.length(Dialect::Pgsql, None).as_deref(), Some("3"));
        assert_eq!(column.length(Dialect::Sqlite, None), None);
    }

    #[test]
    fn test_decimal_length_renders_precision_and_scale() {
        let column = Column::new("price", ColumnType::Decimal).precision(10, Some(2));
        assert_eq!(column.length(Dialect::Sqlite, None).as_deref(), Some("10,2"));

        let column = Column::new("price", ColumnType::Decimal).precision(10, None);
        assert_eq!(column.length(Dialect::Mysql, None).as_deref(), Some("10"));
    }
}
