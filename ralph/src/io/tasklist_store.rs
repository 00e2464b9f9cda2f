//! Task-list load helpers with schema validation.
//!
//! Every read site consumes the `Result` explicitly: a malformed or missing
//! task list is a warning at the call site, never an unwind.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde_json::Value;

use crate::tasklist::TaskList;

const TASK_LIST_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/task_list/v1.schema.json"
));

static COMPILED_SCHEMA: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(TASK_LIST_SCHEMA).expect("embedded task list schema should be json");
    validator_for(&schema).expect("embedded task list schema should compile")
});

/// Load and validate the task list from disk (schema, then struct).
pub fn load_task_list(path: &Path) -> Result<TaskList> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read task list {}", path.display()))?;
    parse_task_list(&contents).with_context(|| format!("parse task list {}", path.display()))
}

/// Parse and validate a task list from raw JSON text.
pub fn parse_task_list(contents: &str) -> Result<TaskList> {
    let value: Value = serde_json::from_str(contents).context("parse task list json")?;
    validate_schema(&value)?;
    let list: TaskList = serde_json::from_value(value).context("deserialize task list")?;
    Ok(list)
}

fn validate_schema(instance: &Value) -> Result<()> {
    if COMPILED_SCHEMA.is_valid(instance) {
        return Ok(());
    }
    let messages = COMPILED_SCHEMA
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect::<Vec<_>>();
    Err(anyhow!(
        "task list schema validation failed: {}",
        messages.join("; ")
    ))
}
