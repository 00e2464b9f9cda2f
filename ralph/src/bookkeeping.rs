//! Run bookkeeping: reconcile branch identity against the previous run and
//! prepare the progress log.
//!
//! Branch tracking (archive snapshot + marker update) is best-effort: every
//! failure there is a warning, never an abort. Only the progress log is
//! load-bearing for the run.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::io::archive::archive_files;
use crate::io::branch_marker::{read_marker, write_marker};
use crate::io::paths::ProjectPaths;
use crate::io::progress::ProgressLog;
use crate::io::tasklist_store::load_task_list;
use crate::tasklist::archive_folder_name;

/// Outcome of run preparation.
#[derive(Debug)]
pub struct PreparedRun {
    /// Open handle on the progress log (created or resumed).
    pub log: ProgressLog,
    /// Archive directory written this run, when a branch transition was seen.
    pub archived_to: Option<PathBuf>,
}

/// Reconcile the current run against the previous one and open the log.
pub fn prepare_run(paths: &ProjectPaths) -> Result<PreparedRun> {
    let branch_name = current_branch_name(paths);

    let archived_to = match archive_if_branch_changed(paths, branch_name.as_deref()) {
        Ok(dir) => dir,
        Err(err) => {
            warn!(err = format!("{err:#}"), "branch archive failed, continuing");
            None
        }
    };

    if let Some(branch) = branch_name.as_deref().filter(|b| !b.is_empty())
        && let Err(err) = write_marker(&paths.branch_marker_path, branch)
    {
        warn!(err = format!("{err:#}"), "failed to record branch marker, continuing");
    }

    let log = ProgressLog::open(&paths.progress_log_path, &paths.root)?;
    Ok(PreparedRun { log, archived_to })
}

/// Best-effort branch name from the task list. Parse failures warn and read
/// as "no branch".
fn current_branch_name(paths: &ProjectPaths) -> Option<String> {
    if !paths.task_list_path.exists() {
        return None;
    }
    match load_task_list(&paths.task_list_path) {
        Ok(list) => list.branch_name,
        Err(err) => {
            warn!(
                err = format!("{err:#}"),
                "task list unreadable during bookkeeping, skipping branch tracking"
            );
            None
        }
    }
}

/// Snapshot the previous run's task list and progress log when the branch
/// recorded in the marker differs from the task list's current branch.
fn archive_if_branch_changed(
    paths: &ProjectPaths,
    current_branch: Option<&str>,
) -> Result<Option<PathBuf>> {
    if !paths.task_list_path.exists() {
        return Ok(None);
    }
    let Some(last_branch) = read_marker(&paths.branch_marker_path)? else {
        return Ok(None);
    };
    let Some(current) = current_branch.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    if last_branch.is_empty() || last_branch == current {
        return Ok(None);
    }

    let folder = archive_folder_name(Local::now().date_naive(), &last_branch);
    let dir = archive_files(
        &paths.archive_dir,
        &folder,
        &[&paths.task_list_path, &paths.progress_log_path],
    )?;
    info!(
        from = %last_branch,
        to = %current,
        dir = %dir.display(),
        "branch changed, archived previous run"
    );
    Ok(Some(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::progress::PROGRESS_LOG_TITLE;
    use crate::test_support::{TestProject, story, task_list};
    use std::fs;

    #[test]
    fn branch_transition_archives_previous_artifacts() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();

        // Previous run: branch feature-x, with an existing progress log.
        write_marker(&paths.branch_marker_path, "ralph/feature-x").expect("seed marker");
        fs::write(&paths.progress_log_path, "old log\n").expect("seed log");
        project
            .write_task_list(&task_list(Some("ralph/feature-y"), vec![story("s-1", false)]))
            .expect("write task list");

        let prepared = prepare_run(paths).expect("prepare");

        let expected_folder =
            archive_folder_name(Local::now().date_naive(), "ralph/feature-x");
        let dir = prepared.archived_to.expect("archive dir");
        assert!(dir.ends_with(&expected_folder));
        assert!(dir.join("prd.json").is_file());
        assert_eq!(
            fs::read_to_string(dir.join("ralph-progress.txt")).expect("read copy"),
            "old log\n"
        );

        // Marker now records the new branch, without a trailing newline.
        assert_eq!(
            fs::read(&paths.branch_marker_path).expect("read marker"),
            b"ralph/feature-y"
        );
    }

    #[test]
    fn no_marker_means_no_archive_but_marker_is_written() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();
        project
            .write_task_list(&task_list(Some("ralph/feature-x"), vec![story("s-1", false)]))
            .expect("write task list");

        let prepared = prepare_run(paths).expect("prepare");

        assert!(prepared.archived_to.is_none());
        assert!(!paths.archive_dir.exists());
        assert_eq!(
            read_marker(&paths.branch_marker_path).expect("read marker"),
            Some("ralph/feature-x".to_string())
        );
    }

    #[test]
    fn unchanged_branch_does_not_archive() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();
        write_marker(&paths.branch_marker_path, "ralph/feature-x").expect("seed marker");
        project
            .write_task_list(&task_list(Some("ralph/feature-x"), vec![story("s-1", false)]))
            .expect("write task list");

        let prepared = prepare_run(paths).expect("prepare");

        assert!(prepared.archived_to.is_none());
        assert!(!paths.archive_dir.exists());
    }

    #[test]
    fn missing_branch_name_leaves_marker_untouched() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();
        write_marker(&paths.branch_marker_path, "ralph/feature-x").expect("seed marker");
        project
            .write_task_list(&task_list(None, vec![story("s-1", false)]))
            .expect("write task list");

        prepare_run(paths).expect("prepare");

        assert_eq!(
            read_marker(&paths.branch_marker_path).expect("read marker"),
            Some("ralph/feature-x".to_string())
        );
        assert!(!paths.archive_dir.exists());
    }

    #[test]
    fn malformed_task_list_warns_and_continues() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();
        write_marker(&paths.branch_marker_path, "ralph/feature-x").expect("seed marker");
        project.write_raw_task_list("{not json").expect("write raw");

        let prepared = prepare_run(paths).expect("prepare should not fail");

        assert!(prepared.archived_to.is_none());
        // Marker keeps the previous branch; the log is still opened.
        assert_eq!(
            read_marker(&paths.branch_marker_path).expect("read marker"),
            Some("ralph/feature-x".to_string())
        );
        assert!(paths.progress_log_path.is_file());
    }

    #[test]
    fn prepare_creates_then_resumes_the_log() {
        let project = TestProject::new().expect("project");
        let paths = project.paths();

        prepare_run(paths).expect("first run");
        prepare_run(paths).expect("second run");

        let contents = fs::read_to_string(&paths.progress_log_path).expect("read log");
        assert_eq!(contents.matches(PROGRESS_LOG_TITLE).count(), 1);
        assert!(contents.contains("Resumed: "));
    }
}
