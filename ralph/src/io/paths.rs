//! Well-known file paths within a project directory.

use std::path::{Path, PathBuf};

/// Task list file name (agent-owned).
pub const TASK_LIST_FILE: &str = "prd.json";
/// Instructions file name (agent-owned).
pub const INSTRUCTIONS_FILE: &str = "CLAUDE.md";
/// Progress log file name (driver-owned).
pub const PROGRESS_LOG_FILE: &str = "ralph-progress.txt";
/// Last-branch marker file name (driver-owned).
pub const BRANCH_MARKER_FILE: &str = ".ralph-last-branch";
/// Archive directory name (driver-owned).
pub const ARCHIVE_DIR: &str = ".ralph-archive";
/// Optional driver configuration file name.
pub const CONFIG_FILE: &str = "ralph.toml";

/// All canonical paths the driver touches, resolved against a project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub task_list_path: PathBuf,
    pub instructions_path: PathBuf,
    pub progress_log_path: PathBuf,
    pub branch_marker_path: PathBuf,
    pub archive_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            task_list_path: root.join(TASK_LIST_FILE),
            instructions_path: root.join(INSTRUCTIONS_FILE),
            progress_log_path: root.join(PROGRESS_LOG_FILE),
            branch_marker_path: root.join(BRANCH_MARKER_FILE),
            archive_dir: root.join(ARCHIVE_DIR),
            config_path: root.join(CONFIG_FILE),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_stable() {
        let paths = ProjectPaths::new(Path::new("/tmp/project"));

        assert!(paths.task_list_path.ends_with("prd.json"));
        assert!(paths.instructions_path.ends_with("CLAUDE.md"));
        assert!(paths.progress_log_path.ends_with("ralph-progress.txt"));
        assert!(paths.branch_marker_path.ends_with(".ralph-last-branch"));
        assert!(paths.archive_dir.ends_with(".ralph-archive"));
        assert!(paths.config_path.ends_with("ralph.toml"));
    }
}
