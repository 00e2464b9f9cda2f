//! The iteration loop: invoke the agent, re-read the task list, decide.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::io::agent::{AgentRequest, AgentRunner};
use crate::io::paths::ProjectPaths;
use crate::io::progress::ProgressLog;
use crate::io::prompt::build_agent_prompt;
use crate::io::tasklist_store::load_task_list;
use crate::tasklist::pass_summary;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// Every story passes (an empty list counts as complete).
    Complete {
        iterations: u32,
        passed: usize,
        total: usize,
    },
    /// The iteration budget ran out before completion.
    Exhausted { iterations: u32 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub stop: LoopStop,
}

/// Operator-facing events emitted while the loop runs. The caller renders
/// them; the loop itself never prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    IterationStarted { iter: u32, max: u32 },
    /// The agent could not be started, timed out, or exited non-zero.
    /// Recoverable: the loop continues to the completion check.
    AgentFailed { detail: String },
    /// The task list is missing or malformed; the completion check for this
    /// iteration is skipped.
    TaskListUnreadable { detail: String },
    Progress { passed: usize, total: usize },
}

/// Run up to `max_iterations` cycles of (invoke agent, re-read task list,
/// check completion).
///
/// Completion is evaluated only after the agent runs: a task list that is
/// already fully passing still costs one invocation per run. Agent failures
/// are recoverable; only progress-log write failures abort the loop.
pub fn run_loop<A: AgentRunner, F: FnMut(&LoopEvent)>(
    paths: &ProjectPaths,
    agent: &A,
    agent_timeout: Option<Duration>,
    max_iterations: u32,
    log: &ProgressLog,
    mut on_event: F,
) -> Result<LoopOutcome> {
    let prompt = build_agent_prompt();

    for iter in 1..=max_iterations {
        on_event(&LoopEvent::IterationStarted {
            iter,
            max: max_iterations,
        });
        log.append_entry(&format!("Iteration {iter} started"))?;

        let request = AgentRequest {
            workdir: paths.root.clone(),
            prompt: prompt.clone(),
            timeout: agent_timeout,
        };
        let failure = match agent.run(&request) {
            Ok(exit) if exit.success() => None,
            Ok(exit) => Some(exit.describe_failure()),
            Err(err) => Some(format!("agent could not be started: {err:#}")),
        };
        if let Some(detail) = failure {
            // The agent may still have made partial progress; fall through
            // to the completion check.
            warn!(iter, detail = %detail, "agent invocation failed");
            log.append_entry(&format!("Iteration {iter} failed: {detail}"))?;
            on_event(&LoopEvent::AgentFailed { detail });
        }

        match load_task_list(&paths.task_list_path) {
            Err(err) => {
                let detail = format!("{err:#}");
                warn!(iter, detail = %detail, "task list unreadable, skipping completion check");
                log.append_entry(&format!("Task list unreadable: {detail}"))?;
                on_event(&LoopEvent::TaskListUnreadable { detail });
            }
            Ok(list) => {
                let summary = pass_summary(&list);
                debug!(iter, passed = summary.passed, total = summary.total, "pass count");
                log.append_entry(&format!(
                    "Stories passing: {}/{}",
                    summary.passed, summary.total
                ))?;
                on_event(&LoopEvent::Progress {
                    passed: summary.passed,
                    total: summary.total,
                });
                if summary.is_complete() {
                    log.append_entry("All stories passing; run complete")?;
                    return Ok(LoopOutcome {
                        stop: LoopStop::Complete {
                            iterations: iter,
                            passed: summary.passed,
                            total: summary.total,
                        },
                    });
                }
            }
        }
    }

    log.append_entry(&format!(
        "Reached max iterations ({max_iterations}) without completion"
    ))?;
    Ok(LoopOutcome {
        stop: LoopStop::Exhausted {
            iterations: max_iterations,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        ScriptedAgent, ScriptedInvocation, TestProject, exit_ok, exit_with, story, task_list,
    };
    use std::fs;

    fn open_log(project: &TestProject) -> ProgressLog {
        ProgressLog::open(&project.paths().progress_log_path, project.root()).expect("open log")
    }

    #[test]
    fn already_passing_list_still_costs_one_invocation() {
        let project = TestProject::new().expect("project");
        project
            .write_task_list(&task_list(None, vec![story("US-1", true)]))
            .expect("write task list");
        let agent = ScriptedAgent::idle();
        let log = open_log(&project);

        let outcome = run_loop(project.paths(), &agent, None, 10, &log, |_| {}).expect("loop");

        assert_eq!(agent.invocations(), 1);
        assert_eq!(
            outcome.stop,
            LoopStop::Complete {
                iterations: 1,
                passed: 1,
                total: 1
            }
        );
    }

    #[test]
    fn empty_list_is_vacuously_complete_after_one_iteration() {
        let project = TestProject::new().expect("project");
        project
            .write_task_list(&task_list(None, Vec::new()))
            .expect("write task list");
        let agent = ScriptedAgent::idle();
        let log = open_log(&project);

        let outcome = run_loop(project.paths(), &agent, None, 5, &log, |_| {}).expect("loop");

        assert_eq!(agent.invocations(), 1);
        assert!(matches!(
            outcome.stop,
            LoopStop::Complete {
                iterations: 1,
                passed: 0,
                total: 0
            }
        ));
    }

    #[test]
    fn never_passing_list_exhausts_the_budget() {
        let project = TestProject::new().expect("project");
        let agent = ScriptedAgent::idle();
        let log = open_log(&project);

        let outcome = run_loop(project.paths(), &agent, None, 3, &log, |_| {}).expect("loop");

        assert_eq!(agent.invocations(), 3);
        assert_eq!(outcome.stop, LoopStop::Exhausted { iterations: 3 });

        let contents =
            fs::read_to_string(&project.paths().progress_log_path).expect("read log");
        assert!(contents.contains("Iteration 3 started"));
        assert!(contents.contains("Reached max iterations (3) without completion"));
    }

    #[test]
    fn agent_failure_does_not_stop_the_loop() {
        let project = TestProject::new().expect("project");
        let agent = ScriptedAgent::new(vec![
            ScriptedInvocation {
                exit: exit_with(1),
                task_list_update: None,
            },
            ScriptedInvocation {
                exit: exit_ok(),
                task_list_update: Some(task_list(None, vec![story("US-1", true)])),
            },
        ]);
        let log = open_log(&project);

        let mut failures = 0;
        let outcome = run_loop(project.paths(), &agent, None, 5, &log, |event| {
            if matches!(event, LoopEvent::AgentFailed { .. }) {
                failures += 1;
            }
        })
        .expect("loop");

        assert_eq!(failures, 1);
        assert_eq!(agent.invocations(), 2);
        assert!(matches!(outcome.stop, LoopStop::Complete { iterations: 2, .. }));

        let contents =
            fs::read_to_string(&project.paths().progress_log_path).expect("read log");
        assert!(contents.contains("Iteration 1 failed: agent exited with code 1"));
    }

    #[test]
    fn completion_is_checked_even_when_the_agent_fails() {
        // A failing agent may still have flipped the last story; the check is
        // independent of the exit code.
        let project = TestProject::new().expect("project");
        let agent = ScriptedAgent::new(vec![ScriptedInvocation {
            exit: exit_with(1),
            task_list_update: Some(task_list(None, vec![story("US-1", true)])),
        }]);
        let log = open_log(&project);

        let outcome = run_loop(project.paths(), &agent, None, 5, &log, |_| {}).expect("loop");

        assert_eq!(agent.invocations(), 1);
        assert!(matches!(outcome.stop, LoopStop::Complete { iterations: 1, .. }));
    }

    #[test]
    fn unreadable_task_list_skips_the_check_and_continues() {
        let project = TestProject::new().expect("project");
        project.write_raw_task_list("{broken").expect("write raw");
        let agent = ScriptedAgent::idle();
        let log = open_log(&project);

        let mut unreadable = 0;
        let mut progress = 0;
        let outcome = run_loop(project.paths(), &agent, None, 2, &log, |event| match event {
            LoopEvent::TaskListUnreadable { .. } => unreadable += 1,
            LoopEvent::Progress { .. } => progress += 1,
            _ => {}
        })
        .expect("loop");

        assert_eq!(unreadable, 2);
        assert_eq!(progress, 0);
        assert_eq!(outcome.stop, LoopStop::Exhausted { iterations: 2 });

        let contents =
            fs::read_to_string(&project.paths().progress_log_path).expect("read log");
        assert!(contents.contains("Task list unreadable"));
    }

    #[test]
    fn progress_counts_are_reported_each_iteration() {
        let project = TestProject::new().expect("project");
        project
            .write_task_list(&task_list(
                None,
                vec![story("US-1", true), story("US-2", false)],
            ))
            .expect("write task list");
        let agent = ScriptedAgent::idle();
        let log = open_log(&project);

        let mut seen = Vec::new();
        run_loop(project.paths(), &agent, None, 1, &log, |event| {
            if let LoopEvent::Progress { passed, total } = event {
                seen.push((*passed, *total));
            }
        })
        .expect("loop");

        assert_eq!(seen, vec![(1, 2)]);
        let contents =
            fs::read_to_string(&project.paths().progress_log_path).expect("read log");
        assert!(contents.contains("Stories passing: 1/2"));
    }
}
