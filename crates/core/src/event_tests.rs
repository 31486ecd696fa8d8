// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

fn draft() -> EventDraft {
    let mut payload = BTreeMap::new();
    payload.insert("path".to_string(), Value::String("docs/readme.txt".into()));
    payload.insert("size".to_string(), Value::Number(12.into()));
    EventDraft::new("file.created", EventScope::Project, "watcher").with_payload(payload)
}

#[test]
fn from_draft_assigns_id_and_timestamp() {
    let clock = FakeClock::new();
    let event = Event::from_draft(draft(), EventId::new("evt-1"), &clock);
    assert_eq!(event.event_id.as_str(), "evt-1");
    assert!(!event.ts.is_empty());
    assert_eq!(event.kind, "file.created");
}

#[test]
fn value_at_resolves_payload_path() {
    let clock = FakeClock::new();
    let event = Event::from_draft(draft(), EventId::new("evt-1"), &clock);
    assert_eq!(event.value_at("payload.path"), Some(Value::String("docs/readme.txt".into())));
    assert_eq!(event.value_at("path"), Some(Value::String("docs/readme.txt".into())));
}

#[test]
fn value_at_resolves_top_level_field() {
    let clock = FakeClock::new();
    let event = Event::from_draft(draft(), EventId::new("evt-1"), &clock);
    assert_eq!(event.value_at("type"), Some(Value::String("file.created".into())));
}

#[test]
fn value_at_missing_path_is_none() {
    let clock = FakeClock::new();
    let event = Event::from_draft(draft(), EventId::new("evt-1"), &clock);
    assert_eq!(event.value_at("payload.missing"), None);
}

#[test]
fn risk_defaults_to_low() {
    let d = EventDraft::new("x", EventScope::Tool, "system");
    assert_eq!(d.risk, Risk::Low);
}
