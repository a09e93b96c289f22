use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::data::{Cell, ColumnType, Table};
use crate::errors::EtlError;
use crate::transport::fs::open_delimited;

/// Read a comma-separated file with a header row into a `Table`.
///
/// Column types are inferred from every non-empty value in the column.
/// Empty fields load as `Cell::Null`.
pub fn read_csv_table(path: &Path) -> Result<Table, EtlError> {
    let mut reader = open_delimited(path)?;
    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>()?;

    let kinds: Vec<ColumnType> = (0..headers.len())
        .map(|col| ColumnType::infer(records.iter().map(|record| &record[col])))
        .collect();

    let mut table = Table::new(
        headers
            .iter()
            .map(str::to_string)
            .zip(kinds.iter().copied()),
    )?;
    for record in &records {
        table.push_row(
            record
                .iter()
                .zip(&kinds)
                .map(|(raw, kind)| Cell::from_field(raw, *kind))
                .collect(),
        );
    }
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "read delimited table"
    );
    Ok(table)
}
