//! CLI help and usage output specs.

use crate::prelude::*;

#[test]
fn amon_no_args_shows_usage_and_exits_nonzero() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn amon_help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn amon_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn amon_daemon_help_shows_subcommands() {
    cli().args(&["daemon", "--help"]).passes().stdout_has("start").stdout_has("stop").stdout_has("status");
}

#[test]
fn amon_run_help_shows_subcommands() {
    cli().args(&["run", "--help"]).passes().stdout_has("start").stdout_has("status").stdout_has("cancel");
}

#[test]
fn amon_hooks_help_shows_subcommands() {
    cli().args(&["hooks", "--help"]).passes().stdout_has("list").stdout_has("pending");
}

#[test]
fn amon_schedule_help_shows_subcommands() {
    cli()
        .args(&["schedule", "--help"])
        .passes()
        .stdout_has("add-interval")
        .stdout_has("add-cron")
        .stdout_has("tick");
}
