//! Test-only fixtures and scripted fakes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::io::agent::{AgentExit, AgentRequest, AgentRunner};
use crate::io::paths::{ProjectPaths, TASK_LIST_FILE};
use crate::preflight::COMPLETION_MARKER;
use crate::tasklist::{Story, TaskList};

/// Create a story with deterministic defaults.
pub fn story(id: &str, passes: bool) -> Story {
    Story {
        id: Some(id.to_string()),
        passes,
    }
}

/// Create a task list from a branch name and stories.
pub fn task_list(branch: Option<&str>, stories: Vec<Story>) -> TaskList {
    TaskList {
        branch_name: branch.map(str::to_string),
        user_stories: stories,
    }
}

/// A temporary project directory seeded with a task list and instructions.
pub struct TestProject {
    _temp: tempfile::TempDir,
    paths: ProjectPaths,
}

impl TestProject {
    /// Create a project with one open story and instructions carrying the
    /// completion marker.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        // Canonicalize so assertions on the "resolved project path" hold on
        // platforms where the temp root is a symlink.
        let root = temp.path().canonicalize().context("canonicalize tempdir")?;
        let paths = ProjectPaths::new(root);

        let project = Self { _temp: temp, paths };
        project.write_task_list(&task_list(None, vec![story("US-1", false)]))?;
        fs::write(
            &project.paths.instructions_path,
            format!("# Instructions\n\nWhen everything passes, output {COMPLETION_MARKER}.\n"),
        )
        .context("write instructions")?;
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn write_task_list(&self, list: &TaskList) -> Result<()> {
        let mut buf = serde_json::to_string_pretty(list).context("serialize task list")?;
        buf.push('\n');
        fs::write(&self.paths.task_list_path, buf).context("write task list")
    }

    pub fn write_raw_task_list(&self, contents: &str) -> Result<()> {
        fs::write(&self.paths.task_list_path, contents).context("write raw task list")
    }
}

/// Exit value for a successful scripted invocation.
pub fn exit_ok() -> AgentExit {
    AgentExit {
        exit_code: Some(0),
        timed_out: false,
    }
}

/// Exit value for a scripted invocation that failed with a code.
pub fn exit_with(code: i32) -> AgentExit {
    AgentExit {
        exit_code: Some(code),
        timed_out: false,
    }
}

/// One scripted agent invocation.
pub struct ScriptedInvocation {
    pub exit: AgentExit,
    /// Task list to write into the working directory before returning,
    /// simulating the agent's side effect.
    pub task_list_update: Option<TaskList>,
}

/// Agent fake that replays a fixed script and counts invocations.
///
/// Once the script is drained, further invocations succeed without side
/// effects.
pub struct ScriptedAgent {
    script: RefCell<VecDeque<ScriptedInvocation>>,
    invocations: Cell<u32>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<ScriptedInvocation>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            invocations: Cell::new(0),
        }
    }

    /// Agent that always succeeds and never touches the task list.
    pub fn idle() -> Self {
        Self::new(Vec::new())
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.get()
    }
}

impl AgentRunner for ScriptedAgent {
    fn run(&self, request: &AgentRequest) -> Result<AgentExit> {
        self.invocations.set(self.invocations.get() + 1);
        let Some(step) = self.script.borrow_mut().pop_front() else {
            return Ok(exit_ok());
        };
        if let Some(list) = &step.task_list_update {
            let mut buf = serde_json::to_string_pretty(list).context("serialize task list")?;
            buf.push('\n');
            fs::write(request.workdir.join(TASK_LIST_FILE), buf)
                .context("write task list update")?;
        }
        Ok(step.exit)
    }
}
