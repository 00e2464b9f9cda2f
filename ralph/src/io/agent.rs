//! Agent invocation behind the [`AgentRunner`] seam.
//!
//! The trait decouples the iteration loop from the actual agent backend
//! (by default the `claude` CLI). Tests use scripted runners that mutate the
//! task list without spawning processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{info, instrument};

use crate::io::process::{CompletedProcess, run_to_completion};

/// Parameters for one agent invocation.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Working directory for the agent process (the project directory).
    pub workdir: PathBuf,
    /// Rendered instructional prompt.
    pub prompt: String,
    /// Optional wall-clock bound; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// Result of one agent invocation that at least started.
///
/// Failure to even spawn is reported through `Err` instead; both cases are
/// recoverable from the loop's point of view.
#[derive(Debug, Clone, Copy)]
pub struct AgentExit {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl AgentExit {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Operator-facing description of a failed invocation.
    pub fn describe_failure(&self) -> String {
        if self.timed_out {
            return "agent timed out".to_string();
        }
        match self.exit_code {
            Some(code) => format!("agent exited with code {code}"),
            None => "agent was terminated by a signal".to_string(),
        }
    }
}

impl From<CompletedProcess> for AgentExit {
    fn from(completed: CompletedProcess) -> Self {
        Self {
            exit_code: completed.exit_code,
            timed_out: completed.timed_out,
        }
    }
}

/// Abstraction over agent execution backends.
pub trait AgentRunner {
    /// Run the agent to completion with the given request.
    fn run(&self, request: &AgentRequest) -> Result<AgentExit>;
}

/// Agent runner that spawns a configured command line.
///
/// The prompt is appended as the final argument, after the configured argv
/// prefix (e.g. `claude --dangerously-skip-permissions -p <prompt>`).
pub struct CommandAgent {
    command: Vec<String>,
}

impl CommandAgent {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl AgentRunner for CommandAgent {
    #[instrument(skip_all, fields(timeout_secs = request.timeout.map(|t| t.as_secs())))]
    fn run(&self, request: &AgentRequest) -> Result<AgentExit> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("agent command must not be empty"))?;
        info!(program, workdir = %request.workdir.display(), "starting agent");

        // The directory change is scoped to the child via current_dir; the
        // driver's own working directory is never touched.
        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(&request.prompt)
            .current_dir(&request.workdir);

        let completed = run_to_completion(cmd, request.timeout)?;
        Ok(AgentExit::from(completed))
    }
}
