//! Cleaning: deduplicate, drop the id, decode packed categories into columns.
//!
//! Column layout after `clean_data`: every joined column in its original
//! order except the id and the packed categories column, followed by one
//! integer column per category in schema order.

use tracing::{debug, info, warn};

use crate::config::{MalformedRowPolicy, PipelineConfig};
use crate::data::{Cell, ColumnType, Table};
use crate::errors::{EtlError, RowError};
use crate::types::{CategoryValue, ColumnName, RowIndex};

/// Packed category schema discovery and decoding.
pub mod categories;
/// First-occurrence duplicate removal.
pub mod dedup;

pub use categories::{
    CategorySchema, SchemaOrigin, category_name, decode_row, discover_categories,
};
pub use dedup::deduplicate;

/// A row dropped because its category field did not fit the schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowFailure {
    /// Position in the deduplicated table.
    pub row: RowIndex,
    /// Identifier of the failing row, if it had one.
    pub id: Option<String>,
    /// Why the row was rejected.
    pub error: RowError,
}

/// What happened while cleaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows in the joined input.
    pub input_rows: usize,
    /// Rows removed as duplicates.
    pub duplicates_removed: usize,
    /// Schema used to decode the category field.
    pub schema: CategorySchema,
    /// Rows rejected under `MalformedRowPolicy::Skip`.
    pub rejected: Vec<RowFailure>,
}

/// Cleaned table plus its report.
#[derive(Clone, Debug)]
pub struct CleanOutcome {
    /// Cleaned table, ready to store.
    pub table: Table,
    /// What the cleaning pass did.
    pub report: CleanReport,
}

/// Deduplicate `table`, drop the id column, and expand the packed category
/// column into one integer column per category.
pub fn clean_data(table: Table, config: &PipelineConfig) -> Result<CleanOutcome, EtlError> {
    table.require_column(&config.id_column, "joined")?;
    table.require_column(&config.categories_column, "joined")?;

    // Absent key columns (e.g. no `original`) read as null for every row.
    let (dedup_key, absent): (Vec<ColumnName>, Vec<ColumnName>) = config
        .dedup_columns
        .iter()
        .cloned()
        .partition(|column| table.column_index(column).is_some());
    if !absent.is_empty() {
        debug!(?absent, "dedup key columns not present in joined table");
    }

    let input_rows = table.row_count();
    let mut table = deduplicate(table, &dedup_key)?;
    let duplicates_removed = input_rows - table.row_count();
    debug!(duplicates_removed, "removed duplicate rows");

    let ids = table.drop_column(&config.id_column).unwrap_or_default();

    let schema = match &config.categories {
        Some(names) => CategorySchema::supplied(names.iter().cloned()),
        None => discover_categories(&table, &config.categories_column)?,
    };
    info!(
        categories = schema.len(),
        origin = ?schema.origin(),
        "category schema ready"
    );

    let packed = table
        .drop_column(&config.categories_column)
        .unwrap_or_default();
    let mut decoded: Vec<Vec<CategoryValue>> = Vec::with_capacity(packed.len());
    let mut rejected = Vec::new();
    for (row, cell) in packed.iter().enumerate() {
        match schema.decode_cell(cell) {
            Ok(values) => decoded.push(values),
            Err(error) => {
                if config.malformed_rows == MalformedRowPolicy::Abort {
                    return Err(EtlError::SchemaMismatch { row, error });
                }
                let id = ids
                    .get(row)
                    .and_then(|id| id.render())
                    .map(|id| id.into_owned());
                warn!(
                    row,
                    id = id.as_deref().unwrap_or("<none>"),
                    %error,
                    "skipping malformed category field"
                );
                rejected.push(RowFailure { row, id, error });
            }
        }
    }

    if !rejected.is_empty() {
        let mut failed = rejected.iter().map(|failure| failure.row).peekable();
        table.retain_rows(|idx, _| {
            if failed.peek() == Some(&idx) {
                failed.next();
                false
            } else {
                true
            }
        });
    }

    for (position, name) in schema.names().iter().enumerate() {
        let values = decoded
            .iter()
            .map(|row| Cell::Integer(row[position]))
            .collect();
        table.append_column(name.clone(), ColumnType::Integer, values)?;
    }

    info!(
        rows = table.row_count(),
        columns = table.column_count(),
        rejected = rejected.len(),
        "cleaned table"
    );
    Ok(CleanOutcome {
        table,
        report: CleanReport {
            input_rows,
            duplicates_removed,
            schema,
            rejected,
        },
    })
}
