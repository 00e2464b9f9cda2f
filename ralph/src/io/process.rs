//! Helper for running a child process with an optional timeout.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// How a child process finished.
#[derive(Debug, Clone, Copy)]
pub struct CompletedProcess {
    /// Exit code if the process exited normally.
    pub exit_code: Option<i32>,
    /// True when the process was killed after exceeding the timeout.
    pub timed_out: bool,
}

impl CompletedProcess {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Spawn a command and block until it terminates.
///
/// Stdout and stderr are inherited so the child streams directly to the
/// operator's terminal; stdin is closed. With `timeout: None` the wait is
/// unbounded. On timeout the child is killed and reaped before returning.
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs())))]
pub fn run_to_completion(mut cmd: Command, timeout: Option<Duration>) -> Result<CompletedProcess> {
    cmd.stdin(std::process::Stdio::null());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn command");
            return Err(err).context("spawn command");
        }
    };

    let (status, timed_out) = match timeout {
        None => (child.wait().context("wait for command")?, false),
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => (status, false),
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                child.kill().context("kill command")?;
                (child.wait().context("wait command after kill")?, true)
            }
        },
    };

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CompletedProcess {
        exit_code: status.code(),
        timed_out,
    })
}
