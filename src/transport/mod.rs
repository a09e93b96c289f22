/// Filesystem transport for delimited inputs and store paths.
pub mod fs;
