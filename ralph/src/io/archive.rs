//! Archive snapshots taken when the task list's branch changes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Create `<archive_root>/<folder_name>/` and copy the given files into it,
/// preserving original filenames. Sources that do not exist are skipped.
///
/// Returns the archive directory path.
pub fn archive_files(archive_root: &Path, folder_name: &str, files: &[&Path]) -> Result<PathBuf> {
    let dir = archive_root.join(folder_name);
    fs::create_dir_all(&dir)
        .with_context(|| format!("create archive directory {}", dir.display()))?;

    for source in files {
        if !source.exists() {
            debug!(source = %source.display(), "skipping missing archive source");
            continue;
        }
        let name = source
            .file_name()
            .ok_or_else(|| anyhow!("archive source has no file name: {}", source.display()))?;
        let dest = dir.join(name);
        fs::copy(source, &dest)
            .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    }

    debug!(dir = %dir.display(), "archive written");
    Ok(dir)
}
