//! Sanitizes persisted or remote payloads into well-formed task records.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::id::TaskId;
use crate::task::{Category, Task};

/// Keep only well-formed task records from an arbitrary decoded payload.
///
/// Anything other than a JSON array yields an empty list. Records that are not
/// objects, or lack a numeric `id`, a string `text` or a boolean `completed`,
/// are dropped, as are repeats of an id already kept. Unknown or missing
/// categories fall back to the default.
#[must_use]
pub fn normalize_tasks(payload: &Value) -> Vec<Task> {
    let Some(records) = payload.as_array() else {
        debug!(kind = value_kind(payload), "task payload is not an array");
        return Vec::new();
    };

    let mut seen = HashSet::with_capacity(records.len());
    let tasks: Vec<Task> = records
        .iter()
        .filter_map(|record| record.as_object().and_then(normalize_record))
        .filter(|task| seen.insert(task.id))
        .collect();

    let dropped = records.len() - tasks.len();
    if dropped > 0 {
        debug!(dropped, kept = tasks.len(), "dropped malformed task records");
    }
    tasks
}

/// Decode JSON text and normalize it. Decode failures yield an empty list.
#[must_use]
pub fn parse_tasks(raw: &str) -> Vec<Task> {
    match serde_json::from_str::<Value>(raw) {
        Ok(payload) => normalize_tasks(&payload),
        Err(err) => {
            debug!(error = %err, "task payload is not valid JSON");
            Vec::new()
        }
    }
}

/// Encode a task list in the cache format.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn serialize_tasks(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

fn normalize_record(record: &Map<String, Value>) -> Option<Task> {
    let id = record.get("id").and_then(integral_id)?;
    let text = record.get("text")?.as_str()?;
    let completed = record.get("completed")?.as_bool()?;
    let category = match record.get("category") {
        None | Some(Value::Null) => Category::default(),
        Some(Value::String(raw)) => Category::from_wire(raw).unwrap_or_default(),
        Some(_) => return None,
    };

    Some(Task {
        id,
        text: text.to_owned(),
        completed,
        category,
    })
}

// Accepts 42 and 42.0 but not 42.5.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integral_id(value: &Value) -> Option<TaskId> {
    if let Some(id) = value.as_i64() {
        return Some(TaskId(id));
    }
    let float = value.as_f64()?;
    let truncated = float.trunc();
    (float.is_finite() && truncated == float && truncated.abs() < 9.0e15)
        .then_some(TaskId(truncated as i64))
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
