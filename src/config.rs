use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::columns::{CATEGORIES_COLUMN, ID_COLUMN, ORIGINAL_COLUMN};
use crate::constants::storage::DEFAULT_TABLE_NAME;
use crate::errors::EtlError;
use crate::types::{CategoryName, ColumnName, TableName};

/// How the persister treats an existing destination table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop the existing table and write a fresh one.
    #[default]
    Replace,
    /// Insert into the existing table; its columns must match.
    Append,
    /// Refuse to write when the table already exists.
    Fail,
}

/// What the cleaner does with a row whose category field does not fit the schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedRowPolicy {
    /// Report the row, drop it, keep processing the rest.
    #[default]
    Skip,
    /// Stop at the first malformed row.
    Abort,
}

/// Externally supplied, ordered category set.
///
/// Serialized as `{"categories": ["related", "request", ...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySchemaFile {
    /// Category names in column order.
    pub categories: Vec<CategoryName>,
}

impl CategorySchemaFile {
    /// Read and validate a schema file.
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            EtlError::Configuration(format!(
                "cannot read category schema '{}': {err}",
                path.display()
            ))
        })?;
        let parsed: Self = serde_json::from_str(&raw).map_err(|err| {
            EtlError::Configuration(format!(
                "invalid category schema '{}': {err}",
                path.display()
            ))
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), EtlError> {
        let mut seen = std::collections::HashSet::new();
        for name in &self.categories {
            if name.is_empty() {
                return Err(EtlError::Configuration(
                    "category schema contains an empty name".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(EtlError::Configuration(format!(
                    "category schema lists '{name}' more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Join key shared by both inputs; dropped after deduplication.
    pub id_column: ColumnName,
    /// Column holding the packed category field.
    pub categories_column: ColumnName,
    /// Columns that together identify a duplicate row (first occurrence wins).
    pub dedup_columns: Vec<ColumnName>,
    /// Explicit category set; `None` infers it from the first row.
    pub categories: Option<Vec<CategoryName>>,
    /// Treatment of rows that do not fit the category schema.
    pub malformed_rows: MalformedRowPolicy,
    /// Destination table name.
    pub table_name: TableName,
    /// Treatment of an existing destination table.
    pub write_mode: WriteMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_string(),
            categories_column: CATEGORIES_COLUMN.to_string(),
            dedup_columns: vec![ORIGINAL_COLUMN.to_string(), ID_COLUMN.to_string()],
            categories: None,
            malformed_rows: MalformedRowPolicy::default(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            write_mode: WriteMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Override the join key. Dedup key columns that named the old key follow it.
    pub fn with_id_column(mut self, id_column: impl Into<ColumnName>) -> Self {
        let id_column = id_column.into();
        for column in &mut self.dedup_columns {
            if *column == self.id_column {
                *column = id_column.clone();
            }
        }
        self.id_column = id_column;
        self
    }

    /// Override the packed category column name.
    pub fn with_categories_column(mut self, categories_column: impl Into<ColumnName>) -> Self {
        self.categories_column = categories_column.into();
        self
    }

    /// Override the duplicate-detection key columns.
    pub fn with_dedup_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        self.dedup_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Supply the ordered category set instead of inferring it.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CategoryName>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Set the malformed-row policy.
    pub fn with_malformed_rows(mut self, policy: MalformedRowPolicy) -> Self {
        self.malformed_rows = policy;
        self
    }

    /// Set the destination table name.
    pub fn with_table_name(mut self, table_name: impl Into<TableName>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Set the destination write mode.
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Reject configurations that cannot produce a valid run.
    pub fn validate(&self) -> Result<(), EtlError> {
        if self.table_name.trim().is_empty() {
            return Err(EtlError::Configuration(
                "table name must not be empty".to_string(),
            ));
        }
        if self.id_column.is_empty() || self.categories_column.is_empty() {
            return Err(EtlError::Configuration(
                "id and categories column names must not be empty".to_string(),
            ));
        }
        if self.id_column == self.categories_column {
            return Err(EtlError::Configuration(format!(
                "id column and categories column are both '{}'",
                self.id_column
            )));
        }
        if self.dedup_columns.is_empty() {
            return Err(EtlError::Configuration(
                "at least one dedup column is required".to_string(),
            ));
        }
        if let Some(categories) = &self.categories {
            CategorySchemaFile {
                categories: categories.clone(),
            }
            .validate()?;
        }
        Ok(())
    }
}
