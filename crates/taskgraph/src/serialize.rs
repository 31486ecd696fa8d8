// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic serialization and tolerant parsing for TaskGraph JSON (C6),
//! grounded in `original_source/src/amon/taskgraph2/serialize.py`.

use crate::error::TaskGraphError;
use crate::schema::{validate_task_graph, TaskGraph};

/// Serializes `graph` to compact, sorted-key JSON after validating it.
/// Two structurally identical graphs dump to byte-equal output.
pub fn dumps_task_graph(graph: &TaskGraph) -> Result<String, TaskGraphError> {
    validate_task_graph(graph)?;
    let value = serde_json::to_value(graph).map_err(|err| TaskGraphError::Invalid(err.to_string()))?;
    let sorted = sort_keys(value);
    serde_json::to_string(&sorted).map_err(|err| TaskGraphError::Invalid(err.to_string()))
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Tolerant parser: strips code-fence wrappers, falls back to scanning for
/// the first outer balanced `{…}` object when the text isn't valid JSON on
/// its own, then re-validates strictly. Absorbs LLM chatter around the JSON.
pub fn loads_task_graph(text: &str) -> Result<TaskGraph, TaskGraphError> {
    let stripped = strip_code_fences(text);
    let candidate = extract_outer_json_object(&stripped)
        .ok_or_else(|| TaskGraphError::ExtractionFailed("no balanced JSON object found".to_string()))?;

    let graph: TaskGraph =
        serde_json::from_str(&candidate).map_err(|err| TaskGraphError::ExtractionFailed(err.to_string()))?;
    validate_task_graph(&graph)?;
    Ok(graph)
}

fn strip_code_fences(text: &str) -> String {
    let cleaned = text.trim();
    if cleaned.starts_with("```") && cleaned.ends_with("```") {
        let lines: Vec<&str> = cleaned.lines().collect();
        if lines.len() >= 2 {
            let first = lines[0].trim().to_lowercase();
            if matches!(first.as_str(), "```json" | "```jsonc" | "```javascript" | "```") {
                return lines[1..lines.len() - 1].join("\n").trim().to_string();
            }
        }
    }
    cleaned.to_string()
}

fn extract_outer_json_object(text: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if value.is_object() {
            return Some(text.to_string());
        }
    }

    let chars: Vec<char> = text.chars().collect();
    let mut search_from = 0usize;
    while let Some(rel_start) = chars[search_from..].iter().position(|c| *c == '{') {
        let start = search_from + rel_start;
        let mut depth: i32 = 0;
        let mut in_string = false;
        let mut escape = false;
        for idx in start..chars.len() {
            let ch = chars[idx];
            if in_string {
                if escape {
                    escape = false;
                } else if ch == '\\' {
                    escape = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let snippet: String = chars[start..=idx].iter().collect();
                        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&snippet) {
                            if parsed.is_object() {
                                return Some(snippet);
                            }
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
        if search_from >= chars.len() {
            break;
        }
    }
    None
}

#[cfg(test)]
#[path = "serialize_tests.rs"]
mod tests;
