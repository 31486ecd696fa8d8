// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use amon_core::{Clock, Event, EventId, EventScope, FakeClock, Risk};
use serde_json::json;
use tempfile::tempdir;

use super::*;

fn hook(event_type: &str) -> Hook {
    Hook {
        hook_id: "h1".into(),
        event_types: vec![event_type.into()],
        filters: HookFilter::default(),
        action: HookAction {
            kind: "tool.call".into(),
            tool: Some("filesystem.read".into()),
            args: BTreeMap::new(),
        },
        policy: HookPolicy::default(),
        enabled: true,
        dedupe_key: None,
        cooldown_seconds: None,
        max_concurrency: None,
    }
}

fn event(event_type: &str, payload: BTreeMap<String, serde_json::Value>) -> Event {
    Event {
        event_id: EventId::new("evt-1"),
        kind: event_type.into(),
        scope: EventScope::Project,
        actor: "watcher".into(),
        payload,
        risk: Risk::Low,
        project_id: None,
        run_id: None,
        node_id: None,
        tool: None,
        ts: "2026-07-27T09:00:00+00:00".into(),
    }
}

fn state_store() -> (tempfile::TempDir, HookStateStore) {
    let dir = tempdir().expect("tempdir");
    let store = HookStateStore::new(dir.path().join("state.json"));
    (dir, store)
}

#[test]
fn disabled_hook_never_matches() {
    let mut h = hook("file.created");
    h.enabled = false;
    let (_dir, store) = state_store();
    let clock = FakeClock::new();
    let matches = match_hooks(&event("file.created", BTreeMap::new()), &[h], &clock, &store);
    assert!(matches.is_empty());
}

#[test]
fn wrong_event_type_never_matches() {
    let h = hook("file.created");
    let (_dir, store) = state_store();
    let clock = FakeClock::new();
    let matches = match_hooks(&event("file.deleted", BTreeMap::new()), &[h], &clock, &store);
    assert!(matches.is_empty());
}

#[test]
fn path_glob_matches_against_event_path() {
    let mut h = hook("file.created");
    h.filters.path_glob = Some("**/*.txt".into());
    let (_dir, store) = state_store();
    let clock = FakeClock::new();

    let mut payload = BTreeMap::new();
    payload.insert("path".into(), json!("docs/readme.txt"));
    assert_eq!(
        match_hooks(&event("file.created", payload), std::slice::from_ref(&h), &clock, &store).len(),
        1
    );

    let mut payload = BTreeMap::new();
    payload.insert("path".into(), json!("docs/readme.md"));
    assert!(match_hooks(&event("file.created", payload), &[h], &clock, &store).is_empty());
}

#[test]
fn min_size_rejects_smaller_events() {
    let mut h = hook("file.created");
    h.filters.min_size = Some(10);
    let (_dir, store) = state_store();
    let clock = FakeClock::new();

    let mut payload = BTreeMap::new();
    payload.insert("size".into(), json!(5));
    assert!(match_hooks(&event("file.created", payload), &[h.clone()], &clock, &store).is_empty());

    let mut payload = BTreeMap::new();
    payload.insert("size".into(), json!(12));
    assert_eq!(match_hooks(&event("file.created", payload), &[h], &clock, &store).len(), 1);
}

#[test]
fn mime_wildcard_matches_prefix_only() {
    let mut h = hook("file.created");
    h.filters.mime = Some("text/*".into());
    let (_dir, store) = state_store();
    let clock = FakeClock::new();

    let mut payload = BTreeMap::new();
    payload.insert("mime".into(), json!("text/plain"));
    assert_eq!(
        match_hooks(&event("file.created", payload), std::slice::from_ref(&h), &clock, &store).len(),
        1
    );

    let mut payload = BTreeMap::new();
    payload.insert("mime".into(), json!("application/text"));
    assert!(match_hooks(&event("file.created", payload), &[h], &clock, &store).is_empty());
}

#[test]
fn ignore_actors_excludes_matching_actor() {
    let mut h = hook("file.created");
    h.filters.ignore_actors = vec!["ci-bot".into()];
    let (_dir, store) = state_store();
    let clock = FakeClock::new();

    let mut e = event("file.created", BTreeMap::new());
    e.actor = "ci-bot".into();
    assert!(match_hooks(&e, &[h], &clock, &store).is_empty());
}

#[test]
fn max_concurrency_blocks_once_inflight_reaches_cap() {
    let mut h = hook("file.created");
    h.max_concurrency = Some(1);
    let (_dir, store) = state_store();
    store.increment_inflight("h1").expect("inc");
    let clock = FakeClock::new();

    assert!(match_hooks(&event("file.created", BTreeMap::new()), &[h], &clock, &store).is_empty());
}

#[test]
fn cooldown_blocks_retrigger_within_window() {
    let mut h = hook("file.created");
    h.cooldown_seconds = Some(300);
    let (_dir, store) = state_store();
    let clock = FakeClock::new();
    store
        .record_trigger("h1", &clock.now_rfc3339(), None)
        .expect("record");

    clock.advance_ms(100_000);
    assert!(match_hooks(&event("file.created", BTreeMap::new()), &[h.clone()], &clock, &store).is_empty());

    clock.advance_ms(260_000);
    assert_eq!(match_hooks(&event("file.created", BTreeMap::new()), &[h], &clock, &store).len(), 1);
}

#[test]
fn dedupe_key_blocks_repeat_without_cooldown() {
    let mut h = hook("file.created");
    h.dedupe_key = Some("{{ event.payload.path }}".into());
    let (_dir, store) = state_store();
    let clock = FakeClock::new();

    let mut payload = BTreeMap::new();
    payload.insert("path".into(), json!("docs/a.txt"));
    let e = event("file.created", payload);

    assert_eq!(match_hooks(&e, std::slice::from_ref(&h), &clock, &store).len(), 1);
    store
        .record_trigger("h1", &clock.now_rfc3339(), Some("docs/a.txt"))
        .expect("record");
    assert!(match_hooks(&e, &[h], &clock, &store).is_empty());
}
