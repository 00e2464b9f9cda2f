//! Task-list model and pure helpers.
//!
//! The task list (`prd.json`) belongs to the agent; the driver only reads
//! the fields named here and never writes the file back, so unknown fields
//! survive untouched.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Branch names the driver manages carry this prefix; it is stripped when
/// deriving archive folder names.
pub const BRANCH_PREFIX: &str = "ralph/";

/// A single unit of work. Ordering in `user_stories` is the priority order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub passes: bool,
}

/// The task list as read from `prd.json`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub user_stories: Vec<Story>,
}

/// Pass counts for a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub passed: usize,
    pub total: usize,
}

impl PassSummary {
    /// True when every story passes. An empty list is vacuously complete.
    pub fn is_complete(&self) -> bool {
        self.passed == self.total
    }
}

/// Count passing stories against the total.
pub fn pass_summary(list: &TaskList) -> PassSummary {
    let total = list.user_stories.len();
    let passed = list
        .user_stories
        .iter()
        .filter(|story| story.passes)
        .count();
    PassSummary { passed, total }
}

/// Derive the archive folder name for a branch transition:
/// `<date>-<branch with the ralph/ prefix stripped>`, sanitized so the
/// result is a single path component.
pub fn archive_folder_name(date: NaiveDate, last_branch: &str) -> String {
    static SANITIZE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

    let stripped = last_branch
        .strip_prefix(BRANCH_PREFIX)
        .unwrap_or(last_branch);
    let slug = SANITIZE_RE.replace_all(stripped, "-");
    format!("{}-{}", date.format("%Y-%m-%d"), slug)
}
