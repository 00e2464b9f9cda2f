//! Binary entry point for the iteration driver.
//!
//! Validates preconditions, reconciles run bookkeeping, then loops the agent
//! until every story in `prd.json` passes or the iteration budget runs out.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ralph::bookkeeping::prepare_run;
use ralph::exit_codes;
use ralph::io::agent::CommandAgent;
use ralph::io::config::load_config;
use ralph::io::paths::ProjectPaths;
use ralph::looping::{LoopEvent, LoopStop, run_loop};
use ralph::logging;
use ralph::preflight::{COMPLETION_MARKER, run_preflight};

#[derive(Parser)]
#[command(
    name = "ralph",
    version,
    about = "Re-run a coding agent until every story in prd.json passes"
)]
struct Cli {
    /// Project directory containing prd.json and CLAUDE.md.
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Maximum number of agent iterations before giving up.
    #[arg(
        short = 'n',
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_iterations: u32,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::EXHAUSTED
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<i32> {
    let root = cli.project_dir.canonicalize().with_context(|| {
        format!("resolve project directory {}", cli.project_dir.display())
    })?;
    let paths = ProjectPaths::new(root);
    let config = load_config(&paths.config_path)?;

    let report = match run_preflight(&paths, &config.agent.command[0]) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{err}");
            return Ok(err.exit_code());
        }
    };
    if !report.instructions_have_marker {
        eprintln!(
            "warning: {} does not contain the completion marker {COMPLETION_MARKER}",
            paths.instructions_path.display()
        );
    }

    let prepared = prepare_run(&paths)?;
    let agent = CommandAgent::new(config.agent.command.clone());
    let timeout =
        (config.agent.timeout_secs > 0).then(|| Duration::from_secs(config.agent.timeout_secs));

    let outcome = run_loop(
        &paths,
        &agent,
        timeout,
        cli.max_iterations,
        &prepared.log,
        render_event,
    )?;

    match outcome.stop {
        LoopStop::Complete { passed, total, .. } => {
            println!("\nAll stories passing ({passed}/{total}). Run complete.");
            Ok(exit_codes::OK)
        }
        LoopStop::Exhausted { iterations } => {
            println!("\nReached max iterations ({iterations}) without completion.");
            Ok(exit_codes::EXHAUSTED)
        }
    }
}

fn render_event(event: &LoopEvent) {
    match event {
        LoopEvent::IterationStarted { iter, max } => {
            println!("\n=== Iteration {iter}/{max} ===");
        }
        LoopEvent::AgentFailed { detail } => {
            eprintln!("warning: {detail} (continuing)");
        }
        LoopEvent::TaskListUnreadable { detail } => {
            eprintln!("warning: task list unreadable: {detail}");
        }
        LoopEvent::Progress { passed, total } => {
            println!("Stories passing: {passed}/{total}");
        }
    }
}
