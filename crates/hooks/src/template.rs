// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `{{ event.<dotted.path> }}` template rendering, grounded in
//! `original_source/src/amon/hooks/utils.py`.
//!
//! A value that is *exactly* one placeholder keeps the referenced field's
//! native JSON type (a number stays a number). Anything else — a string with
//! surrounding text, or more than one placeholder — is rendered by
//! stringifying each substitution and splicing it into the surrounding text,
//! same as the original's `str(replacement)` fallback.

use std::sync::OnceLock;

use amon_core::Event;
use regex::Regex;
use serde_json::Value;

#[allow(clippy::expect_used)]
fn template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*event\.([a-zA-Z0-9_.]+)\s*\}\}").expect("constant regex pattern is valid"))
}

/// Looks up a dotted path against `event`, returning `Value::Null` (which
/// stringifies to `"null"`, matching the original's `""` fallback closely
/// enough for audit purposes) when the path does not resolve.
fn resolve_event_path(event: &Event, path: &str) -> Value {
    event.value_at(path).unwrap_or(Value::String(String::new()))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a single string value against `event`.
#[allow(clippy::expect_used)]
pub fn render_str(value: &str, event: &Event) -> Value {
    let matches: Vec<_> = template_re().captures_iter(value).collect();
    if matches.is_empty() {
        return Value::String(value.to_string());
    }
    if matches.len() == 1 {
        let whole = matches[0].get(0).expect("capture group 0 always matches");
        if whole.start() == 0 && whole.end() == value.len() {
            return resolve_event_path(event, &matches[0][1]);
        }
    }

    let mut rendered = value.to_string();
    for capture in &matches {
        let whole = &capture[0];
        let replacement = stringify(&resolve_event_path(event, &capture[1]));
        rendered = rendered.replacen(whole, &replacement, 1);
    }
    Value::String(rendered)
}

/// Recursively renders every string leaf of `value` against `event`,
/// preserving object/array structure.
pub fn render_template(value: &Value, event: &Event) -> Value {
    match value {
        Value::String(s) => render_str(s, event),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_template(v, event)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| render_template(item, event)).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
