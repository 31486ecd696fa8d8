// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;

use tempfile::tempdir;

use super::*;

#[test]
fn load_hook_derives_hook_id_from_file_stem() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("on-txt-created.yaml");
    fs::write(
        &path,
        "event_types: [file.created]\naction:\n  type: tool.call\n  tool: filesystem.read\n",
    )
    .expect("write");

    let hook = load_hook(&path).expect("load");
    assert_eq!(hook.hook_id, "on-txt-created");
    assert_eq!(hook.event_types, vec!["file.created".to_string()]);
    assert!(hook.enabled);
}

#[test]
fn load_hook_rejects_missing_event_types() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "event_types: []\naction:\n  type: tool.call\n  tool: x\n").expect("write");

    let error = load_hook(&path).unwrap_err();
    assert!(matches!(error, HookError::Invalid { .. }));
}

#[test]
fn load_hook_rejects_invalid_yaml() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "not: [valid\n").expect("write");

    let error = load_hook(&path).unwrap_err();
    assert!(matches!(error, HookError::Parse { .. }));
}

#[test]
fn load_hooks_skips_invalid_files_and_keeps_valid_ones() {
    let dir = tempdir().expect("tempdir");
    fs::write(
        dir.path().join("good.yaml"),
        "event_types: [file.created]\naction:\n  type: tool.call\n  tool: filesystem.read\n",
    )
    .expect("write");
    fs::write(dir.path().join("bad.yaml"), "event_types: []\n").expect("write");

    let hooks = load_hooks(dir.path());
    assert_eq!(hooks.len(), 1);
    assert_eq!(hooks[0].hook_id, "good");
}

#[test]
fn load_hooks_returns_empty_for_missing_directory() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("does-not-exist");
    assert!(load_hooks(&missing).is_empty());
}
