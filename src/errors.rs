use std::io;

use thiserror::Error;

use crate::constants::exit_codes;
use crate::types::{CategoryName, ColumnName, RowIndex, TableName};

/// Error type for loading, cleaning, and persistence failures.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Command-line usage error.
    #[error(transparent)]
    Argument(#[from] clap::Error),
    /// Invalid option value or category schema file.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Input is not validly delimited.
    #[error("malformed delimited input: {0}")]
    Csv(#[from] csv::Error),
    /// A required column is absent.
    #[error("{input} input has no '{column}' column")]
    MissingColumn {
        /// Which input was checked.
        input: String,
        /// The absent column.
        column: ColumnName,
    },
    /// The category schema cannot be read from the first row.
    #[error("cannot discover category schema: {0}")]
    CategoryFormat(String),
    /// A row disagrees with the category schema under the abort policy.
    #[error("row {row} does not match the category schema: {error}")]
    SchemaMismatch {
        /// Position in the deduplicated table.
        row: RowIndex,
        /// What was wrong with the row.
        error: RowError,
    },
    /// Two columns would share a name.
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(ColumnName),
    /// SQLite failure.
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
    /// Destination table exists under `WriteMode::Fail`.
    #[error("table '{0}' already exists")]
    TableExists(TableName),
    /// Requested table is not in the database.
    #[error("table '{0}' does not exist")]
    TableMissing(TableName),
    /// Appending to a table whose columns differ.
    #[error("table '{table}' has an incompatible schema: {details}")]
    SchemaCollision {
        /// Destination table.
        table: TableName,
        /// Column difference.
        details: String,
    },
}

impl EtlError {
    /// Process exit status for this failure. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Argument(_) | EtlError::Configuration(_) => exit_codes::USAGE,
            EtlError::Io(_) | EtlError::Csv(_) | EtlError::MissingColumn { .. } => {
                exit_codes::INPUT
            }
            EtlError::CategoryFormat(_)
            | EtlError::SchemaMismatch { .. }
            | EtlError::DuplicateColumn(_) => exit_codes::SCHEMA,
            EtlError::Storage(_)
            | EtlError::TableExists(_)
            | EtlError::TableMissing(_)
            | EtlError::SchemaCollision { .. } => exit_codes::STORAGE,
        }
    }
}

/// Reason a single packed category field failed to decode.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RowError {
    /// Null or empty category field.
    #[error("category field is empty")]
    MissingField,
    /// Token count differs from the schema.
    #[error("expected {expected} category tokens, found {found}")]
    TokenCount {
        /// Categories in the schema.
        expected: usize,
        /// Tokens in the field.
        found: usize,
    },
    /// Token value is not a digit.
    #[error("token '{token}' does not end in a digit")]
    InvalidValue {
        /// The offending token.
        token: String,
    },
    /// Token name differs from the supplied schema.
    #[error("token {position} is '{found}', expected category '{expected}'")]
    NameMismatch {
        /// Zero-based token position.
        position: usize,
        /// Name the schema expects.
        expected: CategoryName,
        /// The token as found.
        found: String,
    },
}
