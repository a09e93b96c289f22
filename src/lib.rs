#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Packed category decoding, deduplication, and final column assembly.
pub mod cleaner;
/// Command-line entry point for `process_data`.
pub mod cli;
/// Pipeline configuration types.
pub mod config;
/// Centralized constants for column names, token layout, storage, and exit codes.
pub mod constants;
/// In-memory table and cell types.
pub mod data;
/// Delimited-file loading and the id join.
pub mod loader;
/// SQLite persistence.
pub mod store;
/// Input transports (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use cleaner::{
    CategorySchema, CleanOutcome, CleanReport, RowFailure, SchemaOrigin, clean_data,
    decode_row, deduplicate, discover_categories,
};
pub use config::{CategorySchemaFile, MalformedRowPolicy, PipelineConfig, WriteMode};
pub use data::{Cell, ColumnType, Table};
pub use errors::{EtlError, RowError};
pub use loader::{inner_join, load_data, read_csv_table};
pub use store::{SqliteStore, save_data};
pub use types::{CategoryName, CategoryValue, ColumnName, RowIndex, TableName};
