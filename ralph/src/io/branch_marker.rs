//! Last-branch marker (`.ralph-last-branch`).
//!
//! A single line of text holding the most recently seen branch name. It is
//! only ever compared for string equality to detect branch transitions.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Read the stored branch name, if the marker exists.
///
/// Trailing whitespace is trimmed so a hand-edited marker still compares
/// equal to the value the driver writes.
pub fn read_marker(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read marker {}", path.display()))?;
    Ok(Some(contents.trim_end().to_string()))
}

/// Overwrite the marker with a branch name (no trailing newline).
pub fn write_marker(path: &Path, branch: &str) -> Result<()> {
    fs::write(path, branch).with_context(|| format!("write marker {}", path.display()))
}
