//! `amon hooks` specs against an isolated `AMON_HOME`.

use crate::prelude::*;
use std::fs;

fn isolated_home() -> tempfile::TempDir {
    let home = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(home.path().join("hooks")).expect("mkdir hooks");
    home
}

#[test]
fn list_with_no_hooks_says_so() {
    let home = isolated_home();
    cli()
        .env("AMON_HOME", home.path())
        .args(&["hooks", "list"])
        .passes()
        .stdout_has("No hooks loaded.");
}

#[test]
fn list_reflects_a_loaded_hook_file() {
    let home = isolated_home();
    fs::write(
        home.path().join("hooks").join("on_create.yaml"),
        r#"
event_types: ["file.created"]
action:
  type: tool.call
  tool: fs.read
"#,
    )
    .expect("write hook");

    cli()
        .env("AMON_HOME", home.path())
        .args(&["hooks", "list"])
        .passes()
        .stdout_has("on_create")
        .stdout_has("file.created");
}

#[test]
fn state_for_unknown_hook_reports_zeroed_counters() {
    let home = isolated_home();
    cli()
        .env("AMON_HOME", home.path())
        .args(&["hooks", "state", "never-triggered"])
        .passes()
        .stdout_has("inflight:          0");
}

#[test]
fn pending_with_no_queue_says_so() {
    let home = isolated_home();
    cli()
        .env("AMON_HOME", home.path())
        .args(&["hooks", "pending"])
        .passes()
        .stdout_has("No pending actions.");
}
