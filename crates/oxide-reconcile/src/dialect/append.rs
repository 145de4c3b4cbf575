//! Primary-key and auto-increment markers embedded in column append SQL.

use std::sync::OnceLock;

use regex::Regex;

use super::Dialect;

fn primary_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").expect("valid regex"))
}

fn auto_increment_pattern(dialect: Dialect) -> Option<&'static Regex> {
    static AUTO_INCREMENT: OnceLock<Regex> = OnceLock::new();
    static AUTOINCREMENT: OnceLock<Regex> = OnceLock::new();
    static IDENTITY: OnceLock<Regex> = OnceLock::new();

    let (cell, pattern) = match dialect {
        Dialect::Mysql | Dialect::Cubrid => (&AUTO_INCREMENT, r"(?i)\bAUTO_INCREMENT\b"),
        Dialect::Sqlite => (&AUTOINCREMENT, r"(?i)\bAUTOINCREMENT\b"),
        Dialect::Mssql => (&IDENTITY, r"(?i)\bIDENTITY\b"),
        Dialect::Pgsql | Dialect::Oci => return None,
    };
    Some(cell.get_or_init(|| Regex::new(pattern).expect("valid regex")))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the append SQL carrying primary-key and auto-increment information
/// the way `dialect` writes it inline.
///
/// Returns `None` when neither flag is set or the dialect cannot express the
/// requested combination inline.
#[must_use]
pub fn primary_key_append(dialect: Dialect, primary_key: bool, auto_increment: bool) -> Option<String> {
    let pk = if primary_key { "PRIMARY KEY" } else { "" };
    let ai = if auto_increment {
        dialect.auto_increment_keyword().unwrap_or("")
    } else {
        ""
    };
    let append = match dialect {
        Dialect::Sqlite => format!("{pk} {ai}"),
        Dialect::Mysql | Dialect::Cubrid | Dialect::Mssql => format!("{ai} {pk}"),
        Dialect::Pgsql | Dialect::Oci => pk.to_string(),
    };
    let append = collapse_whitespace(&append);
    if append.is_empty() {
        None
    } else {
        Some(append)
    }
}

/// Returns `true` if the append SQL declares the column as primary key.
#[must_use]
pub fn has_primary_key_info(append: &str) -> bool {
    primary_key_pattern().is_match(append)
}

/// Removes inline primary-key (and the accompanying auto-increment) markers
/// from append SQL.
///
/// Append text without primary-key information is returned untouched.
/// Returns `None` when nothing is left.
#[must_use]
pub fn strip_primary_key_info(dialect: Dialect, append: &str) -> Option<String> {
    if !has_primary_key_info(append) {
        let trimmed = append.trim();
        return if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
    let stripped = strip_key_markers(dialect, append);
    if stripped.residue.is_empty() {
        None
    } else {
        Some(stripped.residue)
    }
}

/// Append SQL with key markers removed, plus which markers were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedAppend {
    /// Remaining append SQL, whitespace-normalized.
    pub residue: String,
    /// Whether a primary-key marker was present.
    pub primary_key: bool,
    /// Whether the dialect's auto-increment marker was present.
    pub auto_increment: bool,
}

/// Removes every primary-key and auto-increment marker known to `dialect`.
#[must_use]
pub fn strip_key_markers(dialect: Dialect, append: &str) -> StrippedAppend {
    let primary_key = has_primary_key_info(append);
    let mut residue = primary_key_pattern().replace_all(append, " ").into_owned();

    let mut auto_increment = false;
    if let Some(pattern) = auto_increment_pattern(dialect) {
        auto_increment = pattern.is_match(&residue);
        residue = pattern.replace_all(&residue, " ").into_owned();
    }

    StrippedAppend {
        residue: collapse_whitespace(&residue),
        primary_key,
        auto_increment,
    }
}
