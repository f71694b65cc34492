use std::fs::DirBuilder;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::Result;

/// Creates a directory if it doesn't exist
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .create(path)?;
    Ok(())
}

/// Writes `bytes` to a fresh temporary file and runs `f` with its path.
///
/// The file is removed before this returns, whether writing, `f`, or neither
/// failed. A failed removal is logged and does not mask the result of `f`.
pub fn with_temp_file<T>(bytes: &[u8], f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;

    let result = f(file.path());

    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        warn!(path = %path.display(), error = %e, "could not delete temporary file");
    }
    result
}
