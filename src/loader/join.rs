use std::collections::HashMap;

use crate::constants::columns::{LEFT_SUFFIX, RIGHT_SUFFIX};
use crate::data::{Cell, Table};
use crate::errors::EtlError;

/// Labels for the two join inputs, used in `MissingColumn` errors.
#[derive(Clone, Copy, Debug)]
pub struct JoinSides<'a> {
    /// Label for the left input.
    pub left: &'a str,
    /// Label for the right input.
    pub right: &'a str,
}

impl<'a> JoinSides<'a> {
    /// Labels for a left and right input.
    pub fn new(left: &'a str, right: &'a str) -> Self {
        Self { left, right }
    }
}

/// Inner-join `left` and `right` on the column `key`.
///
/// Output rows follow left row order; a left row with several matches yields
/// one row per match in right row order. Output columns are every left column
/// followed by every right column except `key`. Non-key names present on both
/// sides get `_x` (left) and `_y` (right) suffixes. Null keys never match.
pub fn inner_join(
    left: &Table,
    right: &Table,
    key: &str,
    sides: JoinSides<'_>,
) -> Result<Table, EtlError> {
    let left_key = left.require_column(key, sides.left)?;
    let right_key = right.require_column(key, sides.right)?;

    let mut columns = Vec::with_capacity(left.column_count() + right.column_count() - 1);
    for (name, kind) in left.columns() {
        if name != key && right.column_index(name).is_some() {
            columns.push((format!("{name}{LEFT_SUFFIX}"), kind));
        } else {
            columns.push((name.to_string(), kind));
        }
    }
    for (name, kind) in right.columns().filter(|(name, _)| *name != key) {
        if left.column_index(name).is_some() {
            columns.push((format!("{name}{RIGHT_SUFFIX}"), kind));
        } else {
            columns.push((name.to_string(), kind));
        }
    }
    let mut joined = Table::new(columns)?;

    let mut matches: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, row) in right.rows().iter().enumerate() {
        if let Some(value) = row[right_key].render() {
            matches.entry(value.into_owned()).or_default().push(idx);
        }
    }

    for left_row in left.rows() {
        let Some(value) = left_row[left_key].render() else {
            continue;
        };
        let Some(right_rows) = matches.get(&*value) else {
            continue;
        };
        for &right_idx in right_rows {
            let right_row = &right.rows()[right_idx];
            let mut row: Vec<Cell> = Vec::with_capacity(joined.column_count());
            row.extend(left_row.iter().cloned());
            row.extend(
                right_row
                    .iter()
                    .enumerate()
                    .filter(|(col, _)| *col != right_key)
                    .map(|(_, cell)| cell.clone()),
            );
            joined.push_row(row);
        }
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;

    fn table(columns: &[(&str, ColumnType)], rows: Vec<Vec<Cell>>) -> Table {
        let mut table = Table::new(columns.iter().map(|(name, kind)| (*name, *kind))).unwrap();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    fn sides() -> JoinSides<'static> {
        JoinSides::new("messages", "categories")
    }

    #[test]
    fn drops_unmatched_rows_and_keeps_left_order() {
        let left = table(
            &[("id", ColumnType::Integer), ("message", ColumnType::Text)],
            vec![
                vec![Cell::Integer(3), Cell::from("third")],
                vec![Cell::Integer(1), Cell::from("first")],
                vec![Cell::Integer(9), Cell::from("orphan")],
            ],
        );
        let right = table(
            &[("id", ColumnType::Integer), ("categories", ColumnType::Text)],
            vec![
                vec![Cell::Integer(1), Cell::from("a-1")],
                vec![Cell::Integer(3), Cell::from("a-0")],
                vec![Cell::Integer(4), Cell::from("a-1")],
            ],
        );
        let joined = inner_join(&left, &right, "id", sides()).unwrap();
        assert_eq!(
            joined.column_names().collect::<Vec<_>>(),
            vec!["id", "message", "categories"]
        );
        assert_eq!(joined.row_count(), 2);
        assert_eq!(joined.cell(0, "message"), Some(&Cell::from("third")));
        assert_eq!(joined.cell(0, "categories"), Some(&Cell::from("a-0")));
        assert_eq!(joined.cell(1, "id"), Some(&Cell::Integer(1)));
    }

    #[test]
    fn repeated_keys_produce_one_row_per_match() {
        let left = table(
            &[("id", ColumnType::Integer), ("message", ColumnType::Text)],
            vec![
                vec![Cell::Integer(5), Cell::from("help")],
                vec![Cell::Integer(5), Cell::from("help")],
            ],
        );
        let right = table(
            &[("id", ColumnType::Integer), ("categories", ColumnType::Text)],
            vec![
                vec![Cell::Integer(5), Cell::from("a-1")],
                vec![Cell::Integer(5), Cell::from("a-0")],
            ],
        );
        let joined = inner_join(&left, &right, "id", sides()).unwrap();
        assert_eq!(joined.row_count(), 4);
        assert_eq!(joined.cell(0, "categories"), Some(&Cell::from("a-1")));
        assert_eq!(joined.cell(1, "categories"), Some(&Cell::from("a-0")));
    }

    #[test]
    fn overlapping_columns_are_suffixed() {
        let left = table(
            &[("id", ColumnType::Integer), ("genre", ColumnType::Text)],
            vec![vec![Cell::Integer(1), Cell::from("news")]],
        );
        let right = table(
            &[("genre", ColumnType::Text), ("id", ColumnType::Integer)],
            vec![vec![Cell::from("social"), Cell::Integer(1)]],
        );
        let joined = inner_join(&left, &right, "id", sides()).unwrap();
        assert_eq!(
            joined.column_names().collect::<Vec<_>>(),
            vec!["id", "genre_x", "genre_y"]
        );
        assert_eq!(joined.cell(0, "genre_y"), Some(&Cell::from("social")));
    }

    #[test]
    fn text_and_integer_keys_match_by_rendered_value() {
        let left = table(
            &[("id", ColumnType::Integer)],
            vec![vec![Cell::Integer(12)], vec![Cell::Null]],
        );
        let right = table(
            &[("id", ColumnType::Text), ("categories", ColumnType::Text)],
            vec![
                vec![Cell::from("12"), Cell::from("a-1")],
                vec![Cell::Null, Cell::from("a-0")],
            ],
        );
        let joined = inner_join(&left, &right, "id", sides()).unwrap();
        assert_eq!(joined.row_count(), 1);
        assert_eq!(joined.cell(0, "categories"), Some(&Cell::from("a-1")));
    }

    #[test]
    fn missing_key_names_the_offending_side() {
        let left = table(&[("message", ColumnType::Text)], Vec::new());
        let right = table(&[("id", ColumnType::Integer)], Vec::new());
        let err = inner_join(&left, &right, "id", sides()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { input, .. } if input == "messages"));
    }
}
