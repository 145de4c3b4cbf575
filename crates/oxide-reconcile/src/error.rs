//! Error types for the reconciliation engine.

/// Errors that can occur while reconciling a table with its migration history.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A structure change payload does not match the shape its method expects.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The target dialect cannot express a required change.
    #[error("{operation} is not supported by {dialect}.")]
    UnsupportedOperation {
        /// The operation, e.g. `DROP COLUMN`.
        operation: String,
        /// Human readable dialect name.
        dialect: String,
    },

    /// Dialect name could not be recognized.
    #[error("Unknown database dialect '{0}'")]
    UnknownDialect(String),

    /// Structure changes of a migration could not be extracted.
    #[error("Failed to extract changes from migration '{migration}': {message}")]
    Extraction {
        /// Migration identifier.
        migration: String,
        /// Error message.
        message: String,
    },

    /// The live structure of a table could not be read.
    #[error("Structure of table '{0}' is unavailable")]
    StructureUnavailable(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading snapshot files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    /// Builds an unsupported-operation error for the given dialect.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>, dialect: crate::dialect::Dialect) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            dialect: dialect.display_name().to_string(),
        }
    }
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
