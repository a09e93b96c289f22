use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use crate::errors::EtlError;
use crate::types::{ColumnName, RowIndex};

/// Storage class inferred for a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Every non-null value is an `i64`.
    Integer,
    /// Every non-null value is an `f64`, at least one is not an integer.
    Real,
    /// Anything else.
    Text,
}

impl ColumnType {
    /// Infer the narrowest type that fits every non-empty raw value.
    ///
    /// A column with no non-empty values is `Text`.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut all_integer = true;
        let mut all_real = true;
        let mut seen = false;
        for value in values.into_iter().filter(|value| !value.is_empty()) {
            seen = true;
            if all_integer && value.parse::<i64>().is_err() {
                all_integer = false;
            }
            if !all_integer && !value.parse::<f64>().is_ok_and(f64::is_finite) {
                all_real = false;
                break;
            }
        }
        match (seen, all_integer, all_real) {
            (false, _, _) => ColumnType::Text,
            (true, true, _) => ColumnType::Integer,
            (true, false, true) => ColumnType::Real,
            (true, false, false) => ColumnType::Text,
        }
    }
}

/// A single table value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Missing value (empty field).
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Finite 64-bit float.
    Real(f64),
    /// Text, stored unmodified.
    Text(String),
}

impl Cell {
    /// Convert a raw delimited field into a cell of the given column type.
    ///
    /// Empty fields become `Null`. Values that do not parse as the column type
    /// fall back to `Text`.
    pub fn from_field(raw: &str, kind: ColumnType) -> Self {
        if raw.is_empty() {
            return Cell::Null;
        }
        match kind {
            ColumnType::Integer => raw
                .parse()
                .map(Cell::Integer)
                .unwrap_or_else(|_| Cell::Text(raw.to_string())),
            ColumnType::Real => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Cell::Real(value),
                _ => Cell::Text(raw.to_string()),
            },
            ColumnType::Text => Cell::Text(raw.to_string()),
        }
    }

    /// True for `Cell::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text content of a `Text` cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Canonical text rendering used for key comparisons. `None` for `Null`.
    ///
    /// Integer cells render without leading zeros, so two integer keys compare
    /// numerically.
    pub fn render(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Null => None,
            Cell::Integer(value) => Some(Cow::Owned(value.to_string())),
            Cell::Real(value) => Some(Cow::Owned(value.to_string())),
            Cell::Text(text) => Some(Cow::Borrowed(text)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

/// Row-major in-memory table with uniquely named, ordered columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<ColumnName, ColumnType>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<N, I>(columns: I) -> Result<Self, EtlError>
    where
        N: Into<ColumnName>,
        I: IntoIterator<Item = (N, ColumnType)>,
    {
        let mut table = Table::default();
        for (name, kind) in columns {
            let name = name.into();
            if table.columns.contains_key(&name) {
                return Err(EtlError::DuplicateColumn(name));
            }
            table.columns.insert(name, kind);
        }
        Ok(table)
    }

    /// Append a row. The row must have one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Column `(name, type)` pairs in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Position of `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Position of `name`, or `MissingColumn` naming `input` as the offending table.
    pub fn require_column(&self, name: &str, input: &str) -> Result<usize, EtlError> {
        self.column_index(name)
            .ok_or_else(|| EtlError::MissingColumn {
                input: input.to_string(),
                column: name.to_string(),
            })
    }

    /// Declared type of `name`, if present.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Row at `idx`.
    pub fn row(&self, idx: RowIndex) -> Option<&[Cell]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Cell at `(row, column name)`.
    pub fn cell(&self, row: RowIndex, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Remove a column, returning its values in row order.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Cell>> {
        let (idx, _, _) = self.columns.shift_remove_full(name)?;
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Append a column after the existing ones. `values` must have one cell per row.
    pub fn append_column(
        &mut self,
        name: impl Into<ColumnName>,
        kind: ColumnType,
        values: Vec<Cell>,
    ) -> Result<(), EtlError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(EtlError::DuplicateColumn(name));
        }
        if values.len() != self.rows.len() {
            return Err(EtlError::Configuration(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        self.columns.insert(name, kind);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Keep only rows for which `keep` returns true, preserving order.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(RowIndex, &[Cell]) -> bool) {
        let mut idx = 0;
        self.rows.retain(|row| {
            let kept = keep(idx, row);
            idx += 1;
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new([
            ("id", ColumnType::Integer),
            ("message", ColumnType::Text),
        ])
        .unwrap();
        table.push_row(vec![Cell::Integer(1), Cell::from("Help")]);
        table.push_row(vec![Cell::Integer(2), Cell::from("Water")]);
        table
    }

    #[test]
    fn infer_picks_narrowest_type() {
        assert_eq!(ColumnType::infer(["1", "", "42"]), ColumnType::Integer);
        assert_eq!(ColumnType::infer(["1", "2.5"]), ColumnType::Real);
        assert_eq!(ColumnType::infer(["1", "two"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["", ""]), ColumnType::Text);
    }

    #[test]
    fn from_field_maps_empty_to_null_and_falls_back_to_text() {
        assert_eq!(Cell::from_field("", ColumnType::Integer), Cell::Null);
        assert_eq!(Cell::from_field("7", ColumnType::Integer), Cell::Integer(7));
        assert_eq!(
            Cell::from_field("x", ColumnType::Integer),
            Cell::Text("x".into())
        );
    }

    #[test]
    fn non_finite_floats_stay_text() {
        assert_eq!(ColumnType::infer(["NaN", "inf"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["1.5", "infinity"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(["1.5", "2"]), ColumnType::Real);
        assert_eq!(
            Cell::from_field("NaN", ColumnType::Real),
            Cell::Text("NaN".into())
        );
    }

    #[test]
    fn integer_keys_render_canonically() {
        let padded = Cell::from_field("007", ColumnType::Integer);
        assert_eq!(padded.render().as_deref(), Some("7"));
        assert_eq!(Cell::Null.render(), None);
    }

    #[test]
    fn new_rejects_duplicate_columns() {
        let err = Table::new([("a", ColumnType::Text), ("a", ColumnType::Text)]).unwrap_err();
        assert!(matches!(err, EtlError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn drop_column_preserves_remaining_order() {
        let mut table = sample();
        let ids = table.drop_column("id").unwrap();
        assert_eq!(ids, vec![Cell::Integer(1), Cell::Integer(2)]);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["message"]);
        assert_eq!(table.cell(1, "message"), Some(&Cell::from("Water")));
        assert!(table.drop_column("id").is_none());
    }

    #[test]
    fn append_column_checks_length_and_name() {
        let mut table = sample();
        table
            .append_column(
                "request",
                ColumnType::Integer,
                vec![Cell::Integer(1), Cell::Integer(0)],
            )
            .unwrap();
        assert_eq!(table.column_count(), 3);
        assert!(table
            .append_column("request", ColumnType::Integer, vec![Cell::Null, Cell::Null])
            .is_err());
        assert!(table
            .append_column("offer", ColumnType::Integer, vec![Cell::Null])
            .is_err());
    }

    #[test]
    fn retain_rows_passes_original_positions() {
        let mut table = sample();
        table.retain_rows(|idx, _| idx == 1);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "id"), Some(&Cell::Integer(2)));
    }

    #[test]
    fn require_column_names_the_input() {
        let err = sample().require_column("categories", "messages").unwrap_err();
        assert_eq!(err.to_string(), "messages input has no 'categories' column");
    }
}
