//! Progress log: the driver-owned product artifact (`ralph-progress.txt`).
//!
//! Append-only. Created with a header on the first run against a project;
//! later runs append a "Resumed:" marker instead, so one file accumulates
//! the history of every run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

/// Literal title written at the top of a fresh log.
pub const PROGRESS_LOG_TITLE: &str = "Ralph Progress Log";

const SEPARATOR: &str = "----------------------------------------";

/// Handle for appending to the progress log.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    /// Open the log for a run.
    ///
    /// Creates the file with a header block (title, start timestamp,
    /// resolved project path, separator) when absent; otherwise appends a
    /// separator and a "Resumed:" line.
    pub fn open(path: impl Into<PathBuf>, project_root: &Path) -> Result<Self> {
        let log = Self { path: path.into() };
        if log.path.exists() {
            debug!(path = %log.path.display(), "resuming existing progress log");
            log.append_raw(&format!("{SEPARATOR}\nResumed: {}\n", timestamp()))?;
        } else {
            debug!(path = %log.path.display(), "creating progress log");
            log.append_raw(&format!(
                "{PROGRESS_LOG_TITLE}\nStarted: {}\nProject: {}\n{SEPARATOR}\n",
                timestamp(),
                project_root.display()
            ))?;
        }
        Ok(log)
    }

    /// Append a timestamped status line.
    pub fn append_entry(&self, message: &str) -> Result<()> {
        self.append_raw(&format!("[{}] {message}\n", timestamp()))
    }

    fn append_raw(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open progress log {}", self.path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("append to progress log {}", self.path.display()))
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
