//! Safe navigation over untyped JSON payloads
//!
//! Every lookup walks a fixed key path and yields `None` as soon as a segment
//! is missing, is not an object, or resolves to `null`.

use serde_json::Value;

/// Follows `path` from `root`, returning the value at the end if every segment
/// exists and the final value is not `null`
///
/// # Examples
///
/// ```
/// use job_crawler::normalizer::navigate;
/// use serde_json::json;
///
/// let payload = json!({"header": {"jobName": "Engineer"}});
/// assert_eq!(navigate(&payload, &["header", "jobName"]), Some(&json!("Engineer")));
/// assert_eq!(navigate(&payload, &["header", "custName"]), None);
/// assert_eq!(navigate(&payload, &["header", "jobName", "deeper"]), None);
/// ```
pub fn navigate<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Joins the `description` of each object in a list into one comma-separated
/// string
///
/// Entries that are not objects, lack a description, or are blank are skipped.
/// Returns `None` when the value is not a list or nothing survives.
pub fn join_descriptions(list: Option<&Value>) -> Option<String> {
    let items = list?.as_array()?;
    let parts: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("description"))
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Joins a list of scalar values into one comma-separated string
///
/// A bare string is returned as-is. Blank entries are skipped; an empty result
/// is `None`.
pub fn join_scalars(value: Option<&Value>) -> Option<String> {
    let parts: Vec<String> = match value? {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    };

    let parts: Vec<String> = parts
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
