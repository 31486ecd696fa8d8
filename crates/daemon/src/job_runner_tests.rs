// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use super::*;
use crate::context::test_support::test_context;

fn write_job_config(home: &std::path::Path, job_id: &str, body: &str) {
    std::fs::create_dir_all(home.join("jobs")).expect("create jobs dir");
    std::fs::write(home.join("jobs").join(format!("{job_id}.yaml")), body).expect("write job config");
}

#[test]
fn start_job_rejects_missing_descriptor() {
    let dir = tempdir().expect("tempdir");
    let ctx = Arc::new(test_context(dir.path()));
    let runner = JobRunner::new(ctx);
    let error = runner.start_job("ghost").expect_err("missing job should error");
    assert!(matches!(error, DaemonError::JobNotFound { .. }));
}

#[tokio::test]
async fn start_job_then_stop_job_writes_running_then_stopped_state() {
    let dir = tempdir().expect("tempdir");
    write_job_config(dir.path(), "heartbeat-only", "heartbeat_interval_seconds: 3600\n");
    let ctx = Arc::new(test_context(dir.path()));
    let runner = JobRunner::new(ctx);

    let status = runner.start_job("heartbeat-only").expect("start");
    assert_eq!(status.status, "running");

    let again = runner.start_job("heartbeat-only");
    assert!(matches!(again, Err(DaemonError::JobAlreadyRunning { .. })));

    let status = runner.stop_job("heartbeat-only").await;
    assert_eq!(status.status, "stopped");
}

#[tokio::test]
async fn status_job_reports_stopped_for_never_started_job() {
    let dir = tempdir().expect("tempdir");
    let ctx = Arc::new(test_context(dir.path()));
    let runner = JobRunner::new(ctx);
    let status = runner.status_job("never-started");
    assert_eq!(status.status, "stopped");
    assert!(status.last_heartbeat_ts.is_none());
}

#[test]
fn scan_paths_picks_up_files_recursively() {
    let dir = tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
    std::fs::write(dir.path().join("sub").join("a.txt"), "hello").expect("write");

    let snapshot = scan_paths(&[dir.path().to_path_buf()]);
    assert_eq!(snapshot.len(), 1);
}

#[tokio::test]
async fn filesystem_watcher_emits_doc_created_for_new_file() {
    let watch_dir = tempdir().expect("tempdir");
    let home_dir = tempdir().expect("tempdir");
    let ctx = Arc::new(test_context(home_dir.path()));
    let stop_token = tokio_util::sync::CancellationToken::new();

    let watch_path = watch_dir.path().to_path_buf();
    let token = stop_token.clone();
    let ctx_clone = Arc::clone(&ctx);
    let handle = tokio::spawn(async move {
        filesystem_watcher(
            ctx_clone,
            "watch-job".to_string(),
            vec![watch_path],
            Duration::from_millis(20),
            Duration::from_millis(0),
            token,
        )
        .await;
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    std::fs::write(watch_dir.path().join("new.txt"), "data").expect("write file");
    tokio::time::sleep(Duration::from_millis(80)).await;
    stop_token.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;

    let log_text = std::fs::read_to_string(home_dir.path().join("logs").join("amon.log")).expect("read log");
    assert!(log_text.contains("doc.created"));
}
