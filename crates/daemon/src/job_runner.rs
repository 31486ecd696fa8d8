// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resident job runner (C10), grounded in
//! `original_source/src/amon/jobs/runner.py`.
//!
//! Each job descriptor (`<home>/jobs/<job_id>.yaml`) can start up to three
//! cooperating tasks: a filesystem watcher (mtime/size snapshot diff with
//! debounce), a polling producer, and a heartbeat writer. The original's
//! three `threading.Thread`s sharing one `threading.Event` become three
//! `tokio::spawn`ed tasks sharing one `CancellationToken`, the natural
//! async-runtime shape for long-running work with a soft-cancel flag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use amon_core::{EventDraft, EventScope, Risk};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::DaemonContext;
use crate::error::DaemonError;

fn default_heartbeat_interval_seconds() -> u64 {
    5
}

fn default_polling_event_type() -> String {
    "job.polling".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct JobConfig {
    watch_paths: Vec<String>,
    debounce_seconds: u64,
    watch_interval_seconds: u64,
    polling_interval_seconds: Option<u64>,
    #[serde(default = "default_polling_event_type")]
    polling_event_type: String,
    #[serde(default = "default_heartbeat_interval_seconds")]
    heartbeat_interval_seconds: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            watch_paths: Vec::new(),
            debounce_seconds: 1,
            watch_interval_seconds: 1,
            polling_interval_seconds: None,
            polling_event_type: default_polling_event_type(),
            heartbeat_interval_seconds: default_heartbeat_interval_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatus {
    pub job_id: String,
    pub status: String,
    pub last_heartbeat_ts: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct JobStateFile {
    job_id: String,
    status: String,
    last_heartbeat_ts: Option<String>,
    last_error: Option<String>,
}

struct RunningJob {
    stop_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Owns the set of currently-started jobs. One instance per daemon process.
pub struct JobRunner {
    ctx: Arc<DaemonContext>,
    running: Mutex<BTreeMap<String, RunningJob>>,
}

impl JobRunner {
    pub fn new(ctx: Arc<DaemonContext>) -> Self {
        Self {
            ctx,
            running: Mutex::new(BTreeMap::new()),
        }
    }

    fn job_config_path(&self, job_id: &str) -> PathBuf {
        self.ctx.home.join("jobs").join(format!("{job_id}.yaml"))
    }

    fn state_path(&self, job_id: &str) -> PathBuf {
        self.ctx.home.join("jobs").join("state").join(format!("{job_id}.json"))
    }

    /// Starts `job_id`'s watcher/polling/heartbeat tasks if not already
    /// running. Returns `JobAlreadyRunning` if it is.
    pub fn start_job(&self, job_id: &str) -> Result<JobStatus, DaemonError> {
        if self.running.lock().contains_key(job_id) {
            return Err(DaemonError::JobAlreadyRunning {
                job_id: job_id.to_string(),
            });
        }
        let config_path = self.job_config_path(job_id);
        if !config_path.exists() {
            return Err(DaemonError::JobNotFound {
                job_id: job_id.to_string(),
                path: config_path,
            });
        }
        let text = amon_store::read_text(&config_path)?;
        let config: JobConfig = serde_yaml::from_str(&text).map_err(|source| DaemonError::Config {
            path: config_path.clone(),
            source,
        })?;

        let stop_token = CancellationToken::new();
        let mut tasks = Vec::new();

        if !config.watch_paths.is_empty() {
            let ctx = Arc::clone(&self.ctx);
            let job_id = job_id.to_string();
            let paths: Vec<PathBuf> = config.watch_paths.iter().map(PathBuf::from).collect();
            let debounce = Duration::from_secs(config.debounce_seconds.max(1));
            let interval = Duration::from_secs(config.watch_interval_seconds.max(1));
            let token = stop_token.clone();
            tasks.push(tokio::spawn(async move {
                filesystem_watcher(ctx, job_id, paths, interval, debounce, token).await;
            }));
        }

        if let Some(polling_interval) = config.polling_interval_seconds.filter(|secs| *secs > 0) {
            let ctx = Arc::clone(&self.ctx);
            let job_id = job_id.to_string();
            let event_type = config.polling_event_type.clone();
            let interval = Duration::from_secs(polling_interval);
            let token = stop_token.clone();
            tasks.push(tokio::spawn(async move {
                polling_job(ctx, job_id, event_type, interval, token).await;
            }));
        }

        {
            let ctx = Arc::clone(&self.ctx);
            let job_id = job_id.to_string();
            let interval = Duration::from_secs(config.heartbeat_interval_seconds.max(1));
            let token = stop_token.clone();
            tasks.push(tokio::spawn(async move {
                heartbeat_loop(ctx, job_id, interval, token).await;
            }));
        }

        self.running.lock().insert(
            job_id.to_string(),
            RunningJob {
                stop_token,
                tasks,
            },
        );
        self.write_state(job_id, "running", None);
        Ok(self.status_job(job_id))
    }

    /// Signals `job_id`'s tasks to stop and waits (up to 5s each) for them
    /// to finish, mirroring `thread.join(timeout=5)`.
    pub async fn stop_job(&self, job_id: &str) -> JobStatus {
        let running = self.running.lock().remove(job_id);
        if let Some(job) = running {
            job.stop_token.cancel();
            for task in job.tasks {
                let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
            }
        }
        self.write_state(job_id, "stopped", None);
        self.status_job(job_id)
    }

    /// Reads the persisted heartbeat state, falling back to `"stopped"`
    /// when no job with this id has ever run.
    pub fn status_job(&self, job_id: &str) -> JobStatus {
        let path = self.state_path(job_id);
        let Ok(text) = amon_store::read_text(&path) else {
            return JobStatus {
                job_id: job_id.to_string(),
                status: "stopped".to_string(),
                last_heartbeat_ts: None,
                last_error: None,
            };
        };
        let state: JobStateFile = serde_json::from_str(&text).unwrap_or_default();
        JobStatus {
            job_id: job_id.to_string(),
            status: state.status,
            last_heartbeat_ts: state.last_heartbeat_ts,
            last_error: state.last_error,
        }
    }

    fn write_state(&self, job_id: &str, status: &str, last_error: Option<String>) {
        let state = JobStateFile {
            job_id: job_id.to_string(),
            status: status.to_string(),
            last_heartbeat_ts: Some(self.ctx.clock.now_rfc3339()),
            last_error,
        };
        if let Err(error) = amon_store::atomic_write_json(&self.state_path(job_id), &state) {
            tracing::error!(job_id, %error, "failed to write job heartbeat state");
        }
    }
}

async fn heartbeat_loop(ctx: Arc<DaemonContext>, job_id: String, interval: Duration, stop_token: CancellationToken) {
    loop {
        write_heartbeat(&ctx, &job_id, "running", None);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop_token.cancelled() => break,
        }
    }
    write_heartbeat(&ctx, &job_id, "stopped", None);
}

fn write_heartbeat(ctx: &Arc<DaemonContext>, job_id: &str, status: &str, last_error: Option<String>) {
    let state = JobStateFile {
        job_id: job_id.to_string(),
        status: status.to_string(),
        last_heartbeat_ts: Some(ctx.clock.now_rfc3339()),
        last_error,
    };
    let path = ctx.home.join("jobs").join("state").join(format!("{job_id}.json"));
    if let Err(error) = amon_store::atomic_write_json(&path, &state) {
        tracing::error!(job_id, %error, "failed to write job heartbeat state");
    }
}

async fn polling_job(
    ctx: Arc<DaemonContext>,
    job_id: String,
    event_type: String,
    interval: Duration,
    stop_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop_token.cancelled() => break,
        }
        if stop_token.is_cancelled() {
            break;
        }
        emit_job_event(&ctx, &job_id, &event_type, BTreeMap::from([
            ("job_id".to_string(), Value::String(job_id.clone())),
            ("message".to_string(), Value::String("polling stub".to_string())),
        ]));
    }
}

async fn filesystem_watcher(
    ctx: Arc<DaemonContext>,
    job_id: String,
    paths: Vec<PathBuf>,
    interval: Duration,
    debounce: Duration,
    stop_token: CancellationToken,
) {
    let mut snapshot = scan_paths(&paths);
    let mut last_emitted: BTreeMap<(String, &'static str), std::time::Instant> = BTreeMap::new();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop_token.cancelled() => break,
        }
        let new_snapshot = scan_paths(&paths);
        diff_snapshots(&ctx, &job_id, &snapshot, &new_snapshot, &mut last_emitted, debounce);
        snapshot = new_snapshot;
    }
}

fn scan_paths(paths: &[PathBuf]) -> BTreeMap<String, (Option<SystemTime>, u64)> {
    let mut snapshot = BTreeMap::new();
    for path in paths {
        scan_into(path, &mut snapshot);
    }
    snapshot
}

fn scan_into(path: &Path, snapshot: &mut BTreeMap<String, (Option<SystemTime>, u64)>) {
    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };
    if metadata.is_dir() {
        let Ok(entries) = std::fs::read_dir(path) else {
            return;
        };
        for entry in entries.flatten() {
            scan_into(&entry.path(), snapshot);
        }
    } else if metadata.is_file() {
        snapshot.insert(
            path.to_string_lossy().to_string(),
            (metadata.modified().ok(), metadata.len()),
        );
    }
}

fn diff_snapshots(
    ctx: &Arc<DaemonContext>,
    job_id: &str,
    old: &BTreeMap<String, (Option<SystemTime>, u64)>,
    new: &BTreeMap<String, (Option<SystemTime>, u64)>,
    last_emitted: &mut BTreeMap<(String, &'static str), std::time::Instant>,
    debounce: Duration,
) {
    for (path, meta) in new {
        if let Some(old_meta) = old.get(path) {
            if old_meta != meta {
                emit_fs_event(ctx, job_id, "doc.updated", path, last_emitted, debounce);
            }
        } else {
            emit_fs_event(ctx, job_id, "doc.created", path, last_emitted, debounce);
        }
    }
    for path in old.keys() {
        if !new.contains_key(path) {
            emit_fs_event(ctx, job_id, "doc.deleted", path, last_emitted, debounce);
        }
    }
}

fn emit_fs_event(
    ctx: &Arc<DaemonContext>,
    job_id: &str,
    event_type: &'static str,
    path: &str,
    last_emitted: &mut BTreeMap<(String, &'static str), std::time::Instant>,
    debounce: Duration,
) {
    let key = (path.to_string(), event_type);
    let now = std::time::Instant::now();
    if let Some(last) = last_emitted.get(&key) {
        if now.duration_since(*last) < debounce {
            return;
        }
    }
    last_emitted.insert(key, now);
    emit_job_event(
        ctx,
        job_id,
        event_type,
        BTreeMap::from([
            ("job_id".to_string(), Value::String(job_id.to_string())),
            ("path".to_string(), Value::String(path.to_string())),
        ]),
    );
}

fn emit_job_event(ctx: &Arc<DaemonContext>, job_id: &str, event_type: &str, payload: BTreeMap<String, Value>) {
    let draft = EventDraft::new(event_type, EventScope::Job, format!("job:{job_id}"))
        .with_payload(payload)
        .with_risk(Risk::Low);
    ctx.emit_event(draft, false);
}

#[cfg(test)]
#[path = "job_runner_tests.rs"]
mod tests;
