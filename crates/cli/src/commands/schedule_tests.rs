// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use tempfile::tempdir;

use crate::output::OutputFormat;
use amon_scheduler::load_schedules;

#[test]
fn add_interval_then_list_round_trips() {
    let home = tempdir().unwrap();
    std::fs::create_dir_all(home.path().join("schedules")).unwrap();

    super::add(home.path(), "nightly".to_string(), None, |s| s.interval_seconds = Some(60.0), OutputFormat::Text).unwrap();

    let file = load_schedules(home.path()).unwrap();
    assert_eq!(file.schedules.len(), 1);
    assert_eq!(file.schedules[0].schedule_id.as_str(), "nightly");
    assert_eq!(file.schedules[0].interval_seconds, Some(60.0));
}

#[test]
fn add_duplicate_schedule_id_errors() {
    let home = tempdir().unwrap();
    std::fs::create_dir_all(home.path().join("schedules")).unwrap();
    super::add(home.path(), "dup".to_string(), None, |s| s.interval_seconds = Some(5.0), OutputFormat::Text).unwrap();

    let err = super::add(home.path(), "dup".to_string(), None, |s| s.interval_seconds = Some(5.0), OutputFormat::Text)
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[test]
fn remove_unknown_schedule_errors() {
    let home = tempdir().unwrap();
    std::fs::create_dir_all(home.path().join("schedules")).unwrap();
    let err = super::remove(home.path(), "ghost", OutputFormat::Text).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn tick_with_no_schedules_fires_nothing() {
    let home = tempdir().unwrap();
    std::fs::create_dir_all(home.path().join("schedules")).unwrap();
    super::tick(home.path(), OutputFormat::Json).unwrap();
}
