//! Precondition checks run before any other work.
//!
//! The four fatal checks run in a fixed order (version control, agent, task
//! list, instructions) and nothing else happens first, so a failed check
//! leaves the project untouched.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::exit_codes;
use crate::io::paths::ProjectPaths;

/// Literal completion marker expected in the instructions file.
pub const COMPLETION_MARKER: &str = "<promise>COMPLETE</promise>";
/// Version-control executable required on PATH.
pub const VCS_PROGRAM: &str = "git";

/// Fatal precondition failure. The only typed error in the crate; it exists
/// so the binary can map each variant to its exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreflightError {
    /// A required executable could not be resolved.
    MissingDependency { program: String },
    /// A required input file does not exist.
    MissingInput { path: PathBuf },
}

impl PreflightError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PreflightError::MissingDependency { .. } => exit_codes::MISSING_DEPENDENCY,
            PreflightError::MissingInput { .. } => exit_codes::MISSING_INPUT,
        }
    }
}

impl fmt::Display for PreflightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreflightError::MissingDependency { program } => {
                write!(f, "required executable '{program}' not found on PATH")
            }
            PreflightError::MissingInput { path } => {
                write!(f, "required input file missing: {}", path.display())
            }
        }
    }
}

impl std::error::Error for PreflightError {}

/// Non-fatal findings from preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    /// Whether the instructions file contains [`COMPLETION_MARKER`].
    pub instructions_have_marker: bool,
}

/// Run the fatal checks in order, then the non-fatal marker check.
pub fn run_preflight(
    paths: &ProjectPaths,
    agent_program: &str,
) -> Result<PreflightReport, PreflightError> {
    ensure_dependency(VCS_PROGRAM)?;
    ensure_dependency(agent_program)?;
    ensure_input(&paths.task_list_path)?;
    ensure_input(&paths.instructions_path)?;

    let instructions_have_marker = instructions_contain_marker(&paths.instructions_path);
    if !instructions_have_marker {
        warn!(
            path = %paths.instructions_path.display(),
            "instructions file does not contain the completion marker"
        );
    }
    Ok(PreflightReport {
        instructions_have_marker,
    })
}

fn ensure_dependency(program: &str) -> Result<(), PreflightError> {
    match resolve_executable(program) {
        Some(resolved) => {
            debug!(program, resolved = %resolved.display(), "dependency resolved");
            Ok(())
        }
        None => Err(PreflightError::MissingDependency {
            program: program.to_string(),
        }),
    }
}

fn ensure_input(path: &Path) -> Result<(), PreflightError> {
    if path.is_file() {
        return Ok(());
    }
    Err(PreflightError::MissingInput {
        path: path.to_path_buf(),
    })
}

/// Resolve a program name against PATH.
///
/// Names containing a path separator are checked directly instead.
pub fn resolve_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

fn instructions_contain_marker(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|contents| contents.contains(COMPLETION_MARKER))
        .unwrap_or(false)
}
