//! Module for reading and writing Models and the tables used to curate them
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

pub mod gpr_parse;
pub mod json;
pub mod locus;
pub mod tables;

/// Write `contents` to a temporary file next to `path`, then rename it over `path`
///
/// A process killed mid write leaves the previous file intact rather than a truncated one.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
