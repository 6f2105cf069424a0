//! Error types for tablepivot.

use thiserror::Error;

/// The main error type for pivot generation and execution.
#[derive(Debug, Error)]
pub enum PivotError {
    /// Column discovery returned nothing: the table is missing or has no columns.
    #[error("no columns found for table {table}")]
    Schema { table: String },

    /// The table name could not be parsed or contains forbidden characters.
    #[error("Invalid identifier '{input}': {message}")]
    InvalidIdentifier { input: String, message: String },

    /// The relational engine rejected a metadata query or a statement.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PivotError {
    /// Create a schema error for the given table.
    pub fn schema(table: impl std::fmt::Display) -> Self {
        Self::Schema {
            table: table.to_string(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            input: input.into(),
            message: message.into(),
        }
    }

    /// True for failures raised during column discovery.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}

/// Result type alias for pivot operations.
pub type PivotResult<T> = Result<T, PivotError>;
