use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};
use tracing::info;

use crate::cleaner::{CleanReport, clean_data};
use crate::config::{CategorySchemaFile, MalformedRowPolicy, PipelineConfig, WriteMode};
use crate::constants::cli::{BIN_NAME, USAGE_EXAMPLE};
use crate::constants::columns::{CATEGORIES_COLUMN, ID_COLUMN};
use crate::constants::storage::DEFAULT_TABLE_NAME;
use crate::errors::EtlError;
use crate::loader::load_data;
use crate::store::save_data;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IfExistsArg {
    Replace,
    Append,
    Fail,
}

impl From<IfExistsArg> for WriteMode {
    fn from(value: IfExistsArg) -> Self {
        match value {
            IfExistsArg::Replace => WriteMode::Replace,
            IfExistsArg::Append => WriteMode::Append,
            IfExistsArg::Fail => WriteMode::Fail,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = BIN_NAME,
    disable_help_subcommand = true,
    about = "Join, deduplicate, and decode message categories into a SQLite table",
    long_about = "Load the messages and categories CSV files, inner-join them on the id column, drop duplicate (original, id) rows, expand the packed category field into one 0/1 column per category, and write the result to a SQLite database.",
    after_help = format!("Example: {USAGE_EXAMPLE}")
)]
/// CLI for `process_data`.
///
/// Common usage:
/// - Default run, replacing `ETL_data`: `process_data messages.csv categories.csv out.db`
/// - Pin the category set: `--category-schema categories.json`
/// - Stop at the first malformed category field: `--strict`
struct ProcessDataCli {
    #[arg(value_name = "MESSAGES_PATH", help = "CSV file with the messages")]
    messages_path: PathBuf,
    #[arg(value_name = "CATEGORIES_PATH", help = "CSV file with the packed categories")]
    categories_path: PathBuf,
    #[arg(value_name = "DATABASE_PATH", help = "SQLite database file to write")]
    database_path: PathBuf,
    #[arg(
        long = "table-name",
        value_name = "NAME",
        default_value = DEFAULT_TABLE_NAME,
        help = "Destination table name"
    )]
    table_name: String,
    #[arg(
        long = "if-exists",
        value_enum,
        default_value_t = IfExistsArg::Replace,
        help = "What to do when the destination table already exists"
    )]
    if_exists: IfExistsArg,
    #[arg(
        long = "category-schema",
        value_name = "PATH",
        help = "JSON file {\"categories\": [...]} fixing the category names and order"
    )]
    category_schema: Option<PathBuf>,
    #[arg(
        long = "id-column",
        value_name = "NAME",
        default_value = ID_COLUMN,
        help = "Join key present in both inputs"
    )]
    id_column: String,
    #[arg(
        long = "categories-column",
        value_name = "NAME",
        default_value = CATEGORIES_COLUMN,
        help = "Column holding the packed category field"
    )]
    categories_column: String,
    #[arg(long, help = "Abort on the first malformed category field instead of skipping it")]
    strict: bool,
}

impl ProcessDataCli {
    fn pipeline_config(&self) -> Result<PipelineConfig, EtlError> {
        let mut config = PipelineConfig::default()
            .with_id_column(self.id_column.clone())
            .with_categories_column(self.categories_column.clone())
            .with_table_name(self.table_name.clone())
            .with_write_mode(self.if_exists.into());
        if self.strict {
            config = config.with_malformed_rows(MalformedRowPolicy::Abort);
        }
        if let Some(path) = &self.category_schema {
            config = config.with_categories(CategorySchemaFile::load(path)?.categories);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Outcome of a completed `process_data` run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Rows written to the destination table.
    pub rows_written: usize,
    /// Cleaning report (duplicates, schema, rejected rows).
    pub report: CleanReport,
}

/// Run the load → clean → save pipeline from command-line arguments
/// (excluding the binary name).
///
/// Returns `Ok(None)` when help or version output was requested.
pub fn run_process_data<I>(args_iter: I) -> Result<Option<RunSummary>, EtlError>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let Some(cli) = parse_cli::<ProcessDataCli, _>(
        std::iter::once(OsString::from(BIN_NAME)).chain(args_iter.into_iter().map(Into::into)),
    )?
    else {
        return Ok(None);
    };
    let config = cli.pipeline_config()?;

    println!(
        "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
        cli.messages_path.display(),
        cli.categories_path.display()
    );
    let joined = load_data(&cli.messages_path, &cli.categories_path, &config.id_column)?;

    println!("Cleaning data...");
    let outcome = clean_data(joined, &config)?;
    if !outcome.report.rejected.is_empty() {
        println!(
            "    skipped {} row(s) with malformed category fields",
            outcome.report.rejected.len()
        );
    }

    println!("Saving data...\n    DATABASE: {}", cli.database_path.display());
    let rows_written = save_data(
        &outcome.table,
        &cli.database_path,
        &config.table_name,
        config.write_mode,
    )?;

    println!("Cleaned data saved to database!");
    info!(rows_written, table = %config.table_name, "run complete");
    Ok(Some(RunSummary {
        rows_written,
        report: outcome.report,
    }))
}

/// Print a failure the way the binary reports it: clap's own usage output for
/// argument errors, one `error:` line for everything else.
pub fn report_error(err: &EtlError) {
    match err {
        EtlError::Argument(clap_err) => {
            let _ = clap_err.print();
        }
        other => eprintln!("error: {other}"),
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, EtlError>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exit_codes;

    fn parse(args: &[&str]) -> Result<Option<ProcessDataCli>, EtlError> {
        parse_cli::<ProcessDataCli, _>(std::iter::once(BIN_NAME).chain(args.iter().copied()))
    }

    #[test]
    fn three_positionals_use_defaults() {
        let cli = parse(&["m.csv", "c.csv", "out.db"]).unwrap().unwrap();
        assert_eq!(cli.database_path, PathBuf::from("out.db"));
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.write_mode, WriteMode::Replace);
        assert_eq!(config.malformed_rows, MalformedRowPolicy::Skip);
    }

    #[test]
    fn wrong_arity_is_a_usage_error() {
        for args in [&["m.csv", "c.csv"][..], &["a", "b", "c", "d"][..], &[][..]] {
            let err = parse(args).unwrap_err();
            assert!(matches!(err, EtlError::Argument(_)));
            assert_eq!(err.exit_code(), exit_codes::USAGE);
        }
    }

    #[test]
    fn options_map_onto_pipeline_config() {
        let cli = parse(&[
            "m.csv",
            "c.csv",
            "out.db",
            "--table-name",
            "messages_clean",
            "--if-exists",
            "append",
            "--strict",
            "--id-column",
            "message_id",
        ])
        .unwrap()
        .unwrap();
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.table_name, "messages_clean");
        assert_eq!(config.write_mode, WriteMode::Append);
        assert_eq!(config.malformed_rows, MalformedRowPolicy::Abort);
        assert_eq!(config.dedup_columns, vec!["original", "message_id"]);
    }
}
