//! Iteration driver that re-runs a coding agent until every story passes.
//!
//! The driver reads a task list (`prd.json`), invokes an external coding
//! agent with a fixed instructional prompt, re-reads the task list, and
//! repeats until every story has `passes: true` or the iteration budget is
//! exhausted. The architecture keeps a strict separation:
//!
//! - **[`tasklist`]**: The task-list model and pure helpers (pass counting,
//!   archive-name derivation). No I/O.
//! - **[`io`]**: Side-effecting operations (filesystem, process execution).
//!   The agent sits behind the [`io::agent::AgentRunner`] trait so the loop
//!   can be tested with scripted fakes.
//!
//! Orchestration modules ([`preflight`], [`bookkeeping`], [`looping`])
//! coordinate the model with I/O to implement the driver's run sequence.

pub mod bookkeeping;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod preflight;
pub mod tasklist;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
