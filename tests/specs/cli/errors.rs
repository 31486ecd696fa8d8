//! CLI argument-parsing error specs.

use crate::prelude::*;

#[test]
fn unknown_subcommand_fails_with_usage() {
    cli().args(&["not-a-command"]).fails().stderr_has("Usage:");
}

#[test]
fn run_status_missing_project_flag_fails() {
    cli().args(&["run", "status", "some-run-id"]).fails();
}

#[test]
fn schedule_add_interval_missing_seconds_fails() {
    cli().args(&["schedule", "add-interval", "nightly"]).fails();
}
