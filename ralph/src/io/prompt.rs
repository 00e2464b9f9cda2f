//! Agent prompt builder.
//!
//! The instructional prompt is fixed per run and is part of the external
//! interface: the agent contract (read the task list, implement one story,
//! run checks, log learnings, commit, flip `passes`) lives in the template.

use minijinja::{Environment, context};

use crate::io::paths::{INSTRUCTIONS_FILE, PROGRESS_LOG_FILE, TASK_LIST_FILE};

const AGENT_TEMPLATE: &str = include_str!("prompts/agent.md");

/// Render the fixed instructional prompt for one run.
pub fn build_agent_prompt() -> String {
    let mut env = Environment::new();
    env.add_template("agent", AGENT_TEMPLATE)
        .expect("agent template should be valid");
    let template = env.get_template("agent").expect("agent template registered");
    template
        .render(context! {
            task_list => TASK_LIST_FILE,
            instructions => INSTRUCTIONS_FILE,
            progress_log => PROGRESS_LOG_FILE,
        })
        .expect("agent template rendering should not fail")
}
