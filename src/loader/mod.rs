//! Input loading: delimited files into tables, then an inner join on the id column.
//!
//! Ownership model:
//! - `read_csv_table` owns parsing and per-column type inference.
//! - `inner_join` owns key matching and column-name disambiguation.
//! - `load_data` wires both for the messages/categories pair.

use std::path::Path;

use tracing::info;

use crate::data::Table;
use crate::errors::EtlError;

/// Delimited-file reader.
pub mod csv_table;
/// Inner join on a shared key column.
pub mod join;

pub use csv_table::read_csv_table;
pub use join::{JoinSides, inner_join};

/// Label used in errors and logs for the messages input.
pub const MESSAGES_INPUT: &str = "messages";
/// Label used in errors and logs for the categories input.
pub const CATEGORIES_INPUT: &str = "categories";

/// Read the messages and categories files and inner-join them on `key`.
pub fn load_data(
    messages_path: &Path,
    categories_path: &Path,
    key: &str,
) -> Result<Table, EtlError> {
    let messages = read_csv_table(messages_path)?;
    let categories = read_csv_table(categories_path)?;
    info!(
        messages = messages.row_count(),
        categories = categories.row_count(),
        "loaded inputs"
    );
    let joined = inner_join(
        &messages,
        &categories,
        key,
        JoinSides::new(MESSAGES_INPUT, CATEGORIES_INPUT),
    )?;
    info!(rows = joined.row_count(), key, "joined inputs");
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_data_joins_messages_with_categories() {
        let temp = tempdir().unwrap();
        let messages = temp.path().join("messages.csv");
        let categories = temp.path().join("categories.csv");
        fs::write(&messages, "id,message,original,genre\n1,Help,Aide,direct\n2,Water,,news\n").unwrap();
        fs::write(&categories, "id,categories\n2,request-1;offer-0\n1,request-0;offer-1\n").unwrap();

        let table = load_data(&messages, &categories, "id").unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["id", "message", "original", "genre", "categories"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "id"), Some(&Cell::Integer(1)));
        assert_eq!(
            table.cell(0, "categories"),
            Some(&Cell::from("request-0;offer-1"))
        );
        assert_eq!(table.cell(1, "original"), Some(&Cell::Null));
    }

    #[test]
    fn load_data_requires_id_on_both_sides() {
        let temp = tempdir().unwrap();
        let messages = temp.path().join("messages.csv");
        let categories = temp.path().join("categories.csv");
        fs::write(&messages, "id,message\n1,Help\n").unwrap();
        fs::write(&categories, "key,categories\n1,request-1\n").unwrap();

        let err = load_data(&messages, &categories, "id").unwrap_err();
        assert!(matches!(
            err,
            EtlError::MissingColumn { ref input, ref column } if input == "categories" && column == "id"
        ));
    }
}
