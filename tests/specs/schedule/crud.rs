//! `amon schedule` CRUD and tick specs against an isolated `AMON_HOME`.

use crate::prelude::*;

#[test]
fn list_with_no_schedules_says_so() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "list"])
        .passes()
        .stdout_has("No schedules.");
}

#[test]
fn add_interval_then_list_shows_it() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "add-interval", "heartbeat", "--seconds", "30"])
        .passes()
        .stdout_has("schedule added: heartbeat");

    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "list"])
        .passes()
        .stdout_has("heartbeat")
        .stdout_has("interval");
}

#[test]
fn add_duplicate_schedule_id_fails() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "add-interval", "heartbeat", "--seconds", "30"])
        .passes();

    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "add-interval", "heartbeat", "--seconds", "30"])
        .fails()
        .stderr_has("already exists");
}

#[test]
fn remove_unknown_schedule_fails() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "remove", "ghost"])
        .fails()
        .stderr_has("not found");
}

#[test]
fn tick_with_no_schedules_fires_nothing() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["schedule", "tick"])
        .passes()
        .stdout_has("No schedules fired.");
}
