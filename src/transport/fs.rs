use std::fs::{self, File};
use std::path::Path;

use csv::{Reader, ReaderBuilder};
use tracing::debug;

use crate::errors::EtlError;

/// Open a comma-separated file whose first record is a header row.
///
/// Rows with a different field count than the header are rejected by the reader.
pub fn open_delimited(path: &Path) -> Result<Reader<File>, EtlError> {
    let file = File::open(path)?;
    debug!(path = %path.display(), "opened delimited input");
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(file))
}

/// Create the parent directory of `path` when it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), EtlError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
