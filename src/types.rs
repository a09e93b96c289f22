/// Column name in a loaded or assembled table.
/// Examples: `id`, `message`, `original`, `genre`
pub type ColumnName = String;
/// Category label discovered from (or supplied for) the packed category field.
/// Examples: `related`, `request`, `aid_related`
pub type CategoryName = String;
/// Destination table name inside the SQLite store.
/// Example: `ETL_data`
pub type TableName = String;
/// Decoded category value for one token (nominally `0` or `1`).
pub type CategoryValue = i64;
/// Zero-based row position inside a table.
pub type RowIndex = usize;
