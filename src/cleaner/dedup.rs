use std::collections::HashSet;

use crate::data::Table;
use crate::errors::EtlError;
use crate::types::ColumnName;

/// Input label used when a dedup key column is missing.
const DEDUP_INPUT: &str = "joined";

/// Drop every row whose `key_columns` tuple already appeared earlier.
///
/// First occurrence wins and survivor order is preserved. Null cells compare
/// equal to each other. Applying this twice removes nothing the second time.
pub fn deduplicate(mut table: Table, key_columns: &[ColumnName]) -> Result<Table, EtlError> {
    let positions = key_columns
        .iter()
        .map(|column| table.require_column(column, DEDUP_INPUT))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(table.row_count());
    table.retain_rows(|_, row| {
        let key = positions
            .iter()
            .map(|&col| row[col].render().map(|value| value.into_owned()))
            .collect();
        seen.insert(key)
    });
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, ColumnType};

    fn keys() -> Vec<ColumnName> {
        vec!["original".to_string(), "id".to_string()]
    }

    fn messages(rows: &[(i64, Option<&str>, &str)]) -> Table {
        let mut table = Table::new([
            ("id", ColumnType::Integer),
            ("original", ColumnType::Text),
            ("message", ColumnType::Text),
        ])
        .unwrap();
        for (id, original, message) in rows {
            table.push_row(vec![
                Cell::Integer(*id),
                original.map(Cell::from).unwrap_or(Cell::Null),
                Cell::from(*message),
            ]);
        }
        table
    }

    #[test]
    fn same_id_and_original_collapse_to_first_occurrence() {
        let table = messages(&[
            (5, Some("help"), "first"),
            (5, Some("help"), "second"),
            (6, Some("help"), "other event"),
        ]);
        let deduped = deduplicate(table, &keys()).unwrap();
        assert_eq!(deduped.row_count(), 2);
        assert_eq!(deduped.cell(0, "message"), Some(&Cell::from("first")));
        assert_eq!(deduped.cell(1, "id"), Some(&Cell::Integer(6)));
    }

    #[test]
    fn null_originals_with_same_id_are_duplicates() {
        let table = messages(&[(1, None, "a"), (1, None, "b"), (2, None, "c")]);
        let deduped = deduplicate(table, &keys()).unwrap();
        assert_eq!(deduped.row_count(), 2);
        assert_eq!(deduped.cell(1, "message"), Some(&Cell::from("c")));
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let table = messages(&[
            (1, Some("x"), "a"),
            (2, Some("x"), "b"),
            (1, Some("x"), "c"),
            (1, Some("y"), "d"),
            (2, Some("x"), "e"),
        ]);
        let once = deduplicate(table, &keys()).unwrap();
        let twice = deduplicate(once.clone(), &keys()).unwrap();
        assert_eq!(once.row_count(), 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn id_only_key_works_without_original_column() {
        let mut table = Table::new([
            ("id", ColumnType::Integer),
            ("message", ColumnType::Text),
        ])
        .unwrap();
        for (id, message) in [(1, "a"), (2, "b"), (1, "c")] {
            table.push_row(vec![Cell::Integer(id), Cell::from(message)]);
        }
        let deduped = deduplicate(table, &["id".to_string()]).unwrap();
        assert_eq!(deduped.row_count(), 2);
        assert_eq!(deduped.cell(1, "message"), Some(&Cell::from("b")));
    }

    #[test]
    fn missing_key_column_is_reported() {
        let table = Table::new([("id", ColumnType::Integer)]).unwrap();
        let err = deduplicate(table, &keys()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { column, .. } if column == "original"));
    }
}
