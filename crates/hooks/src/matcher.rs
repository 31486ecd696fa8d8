// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-to-hook matching (C3), grounded in
//! `original_source/src/amon/hooks/matcher.py`.

use amon_core::{Clock, Event};
use chrono::DateTime;

use crate::state::HookStateStore;
use crate::template::render_str;
use crate::types::Hook;

fn event_actor_ignored(hook: &Hook, event: &Event) -> bool {
    !hook.filters.ignore_actors.is_empty() && hook.filters.ignore_actors.contains(&event.actor)
}

fn path_glob_matches(hook: &Hook, event: &Event) -> bool {
    let Some(pattern) = &hook.filters.path_glob else {
        return true;
    };
    let Some(path) = event.value_at("path").and_then(|v| v.as_str().map(str::to_string)) else {
        return false;
    };
    glob::Pattern::new(pattern)
        .map(|p| p.matches(&path))
        .unwrap_or(false)
}

fn min_size_matches(hook: &Hook, event: &Event) -> bool {
    let Some(min_size) = hook.filters.min_size else {
        return true;
    };
    let size = event.value_at("size").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.parse::<i64>().ok()))
    });
    match size {
        Some(size) => size >= min_size,
        None => false,
    }
}

fn mime_matches(hook: &Hook, event: &Event) -> bool {
    let Some(pattern) = &hook.filters.mime else {
        return true;
    };
    let Some(mime) = event.value_at("mime").and_then(|v| v.as_str().map(str::to_string)) else {
        return false;
    };
    match pattern.strip_suffix("*") {
        Some(prefix) => mime.starts_with(prefix),
        None => &mime == pattern,
    }
}

/// Filter matching, all four clauses required. A field the event does not
/// carry never matches a filter that requires it.
fn match_filters(hook: &Hook, event: &Event) -> bool {
    !event_actor_ignored(hook, event)
        && path_glob_matches(hook, event)
        && min_size_matches(hook, event)
        && mime_matches(hook, event)
}

pub fn dedupe_key_for(hook: &Hook, event: &Event) -> Option<String> {
    let template = hook.dedupe_key.as_ref()?;
    let rendered = render_str(template, event);
    match rendered {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn parse_rfc3339(value: &str) -> Option<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Returns every enabled hook that matches `event`, in load order, applying
/// event-type, filter, concurrency, cooldown, and dedupe rules in that
/// order — all required.
pub fn match_hooks(
    event: &Event,
    hooks: &[Hook],
    clock: &dyn Clock,
    state_store: &HookStateStore,
) -> Vec<Hook> {
    let now = clock.now_utc();
    let mut matches = Vec::new();

    for hook in hooks {
        if !hook.enabled {
            continue;
        }
        if !hook.event_types.iter().any(|t| t == &event.kind) {
            continue;
        }
        if !match_filters(hook, event) {
            continue;
        }

        let state = state_store.get_hook_state(&hook.hook_id);
        if let Some(max_concurrency) = hook.max_concurrency {
            if state.inflight >= max_concurrency {
                continue;
            }
        }

        if let Some(cooldown_seconds) = hook.cooldown_seconds {
            if cooldown_seconds > 0 {
                if let Some(last_triggered) = state
                    .last_triggered_at
                    .as_deref()
                    .and_then(parse_rfc3339)
                {
                    let elapsed = now.signed_duration_since(last_triggered).num_seconds();
                    if elapsed < cooldown_seconds {
                        continue;
                    }
                }
            }
        }

        if let Some(dedupe_key) = dedupe_key_for(hook, event) {
            if let Some(last_seen) = state.dedupe.get(&dedupe_key).and_then(|s| parse_rfc3339(s)) {
                match hook.cooldown_seconds {
                    Some(cooldown_seconds) if cooldown_seconds > 0 => {
                        let elapsed = now.signed_duration_since(last_seen).num_seconds();
                        if elapsed < cooldown_seconds {
                            continue;
                        }
                    }
                    _ => continue,
                }
            }
        }

        matches.push(hook.clone());
    }

    matches
}

#[cfg(test)]
#[path = "matcher_tests.rs"]
mod tests;
