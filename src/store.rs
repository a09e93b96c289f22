use std::path::{Path, PathBuf};

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{Connection, ToSql, params, params_from_iter};
use tracing::{debug, info};

use crate::config::WriteMode;
use crate::constants::storage::{SQL_INTEGER, SQL_REAL, SQL_TEXT};
use crate::data::{Cell, ColumnType, Table};
use crate::errors::EtlError;
use crate::transport::fs::ensure_parent_dir;

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            Cell::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            Cell::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
        })
    }
}

impl ColumnType {
    fn sql_affinity(self) -> &'static str {
        match self {
            ColumnType::Integer => SQL_INTEGER,
            ColumnType::Real => SQL_REAL,
            ColumnType::Text => SQL_TEXT,
        }
    }

    fn from_declared(declared: &str) -> Self {
        if declared.eq_ignore_ascii_case(SQL_INTEGER) {
            ColumnType::Integer
        } else if declared.eq_ignore_ascii_case(SQL_REAL) {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

/// SQLite-backed destination for cleaned tables.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file at `path`, creating parent directories.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, EtlError> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let conn = Connection::open(&path)?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self, EtlError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Database file path, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `name` exists in the database.
    pub fn table_exists(&self, name: &str) -> Result<bool, EtlError> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![name],
            |row| row.get(0),
        )?)
    }

    /// Column names of an existing table, in declaration order.
    pub fn column_names(&self, name: &str) -> Result<Vec<String>, EtlError> {
        Ok(self
            .declared_columns(name)?
            .into_iter()
            .map(|(column, _)| column)
            .collect())
    }

    /// Stored row count of `name`.
    pub fn row_count(&self, name: &str) -> Result<usize, EtlError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Write `table` under `name` according to `mode`, in one transaction.
    ///
    /// Returns the number of rows inserted. Only the table's own columns are
    /// stored; no row-number column is added.
    pub fn write_table(
        &mut self,
        table: &Table,
        name: &str,
        mode: WriteMode,
    ) -> Result<usize, EtlError> {
        if table.column_count() == 0 {
            return Err(EtlError::Configuration(format!(
                "table '{name}' has no columns to store"
            )));
        }
        let exists = self.table_exists(name)?;
        match mode {
            WriteMode::Fail if exists => return Err(EtlError::TableExists(name.to_string())),
            WriteMode::Append if exists => self.verify_append_schema(table, name)?,
            _ => {}
        }

        let tx = self.conn.transaction()?;
        if mode == WriteMode::Replace {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(name)))?;
        }
        if mode == WriteMode::Replace || !exists {
            tx.execute_batch(&create_table_sql(table, name))?;
        }
        {
            let mut stmt = tx.prepare(&insert_sql(table, name))?;
            for row in table.rows() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        info!(
            table = name,
            rows = table.row_count(),
            mode = ?mode,
            "stored table"
        );
        Ok(table.row_count())
    }

    /// Read a stored table back in insertion order.
    pub fn read_table(&self, name: &str) -> Result<Table, EtlError> {
        let declared = self.declared_columns(name)?;
        if declared.is_empty() {
            return Err(EtlError::TableMissing(name.to_string()));
        }
        let column_list = declared
            .iter()
            .map(|(column, _)| quote_ident(column))
            .collect::<Vec<_>>()
            .join(", ");
        let mut table = Table::new(
            declared
                .iter()
                .map(|(column, kind)| (column.clone(), ColumnType::from_declared(kind))),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {column_list} FROM {} ORDER BY rowid",
            quote_ident(name)
        ))?;
        let width = declared.len();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(match row.get_ref(idx)? {
                    ValueRef::Null => Cell::Null,
                    ValueRef::Integer(value) => Cell::Integer(value),
                    ValueRef::Real(value) => Cell::Real(value),
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                        Cell::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                });
            }
            table.push_row(cells);
        }
        Ok(table)
    }

    fn declared_columns(&self, name: &str) -> Result<Vec<(String, String)>, EtlError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![name], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(columns)
    }

    fn verify_append_schema(&self, table: &Table, name: &str) -> Result<(), EtlError> {
        let existing = self.column_names(name)?;
        let incoming: Vec<&str> = table.column_names().collect();
        if existing != incoming {
            return Err(EtlError::SchemaCollision {
                table: name.to_string(),
                details: format!(
                    "existing columns [{}] differ from [{}]",
                    existing.join(", "),
                    incoming.join(", ")
                ),
            });
        }
        Ok(())
    }
}

/// Open the database at `database_path` and write `table` under `table_name`.
pub fn save_data(
    table: &Table,
    database_path: &Path,
    table_name: &str,
    mode: WriteMode,
) -> Result<usize, EtlError> {
    let mut store = SqliteStore::open(database_path)?;
    store.write_table(table, table_name, mode)
}

/// Double-quote an SQL identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &Table, name: &str) -> String {
    let columns = table
        .columns()
        .map(|(column, kind)| format!("{} {}", quote_ident(column), kind.sql_affinity()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns});", quote_ident(name))
}

fn insert_sql(table: &Table, name: &str) -> String {
    let columns = table
        .column_names()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.column_count())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_ident(name)
    )
}
