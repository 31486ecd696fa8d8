//! `amon daemon` lifecycle specs against an isolated `AMON_HOME`.
//!
//! These do not actually spawn `amond` (no such binary is built alongside
//! these specs); they exercise the PID-file bookkeeping that `amon daemon`
//! owns regardless of whether the daemon process exists.

use crate::prelude::*;

#[test]
fn status_with_no_pid_file_reports_not_running() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn status_with_a_stale_pid_reports_not_running() {
    let home = tempfile::tempdir().expect("tempdir");
    // PID 1 almost certainly isn't this test's idea of the daemon, but what
    // matters here is a pid file pointing at a dead/foreign process: the
    // /proc/<pid> liveness check in `running_pid` should reject it only when
    // the path doesn't exist. Use a PID unlikely to be alive in test sandboxes.
    std::fs::write(home.path().join("daemon.pid"), "999999999").expect("write pid");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn stop_with_no_daemon_running_reports_not_running() {
    let home = tempfile::tempdir().expect("tempdir");
    cli()
        .env("AMON_HOME", home.path())
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("not running");
}
