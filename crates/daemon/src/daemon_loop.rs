// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resident daemon's main loop (C11), grounded in
//! `original_source/src/amon/daemon/__init__.py`'s `run_daemon`/`run_daemon_once`.
//!
//! Each tick: fires due schedules, drains and dispatches queued events, and
//! lets the action queue work through whatever that dispatch enqueued. Jobs
//! are started once at startup and run independently on their own tasks —
//! the tick loop never touches them again.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use amon_core::{EventDraft, EventScope, Risk};
use amon_scheduler::ScheduleFired;
use tokio_util::sync::CancellationToken;

use crate::action_queue::ActionQueue;
use crate::context::DaemonContext;
use crate::error::DaemonError;
use crate::job_runner::JobRunner;

/// Runs exactly one tick and returns — used by `amon daemon run --once` and
/// by tests. Starts and stops its own action queue so the worker pool
/// drains completely before returning.
pub async fn run_daemon_once(ctx: Arc<DaemonContext>, job_runner: &JobRunner) -> Result<(), DaemonError> {
    ctx.hook_state.reset_inflight_on_startup()?;
    ctx.reload_hooks();

    let queue = ActionQueue::start(Arc::clone(&ctx), ctx.config.worker_count.max(1));
    ctx.install_action_queue(queue.clone());

    ensure_jobs_started(&ctx, job_runner);
    run_tick(&ctx)?;
    queue.wait_for_idle(Duration::from_secs(10)).await;
    queue.stop();
    Ok(())
}

/// Runs the tick loop until `stop_token` is cancelled, sleeping
/// `config.tick_interval_seconds` between ticks.
pub async fn run_daemon(
    ctx: Arc<DaemonContext>,
    job_runner: Arc<JobRunner>,
    stop_token: CancellationToken,
) -> Result<(), DaemonError> {
    ctx.hook_state.reset_inflight_on_startup()?;
    ctx.reload_hooks();

    let queue = ActionQueue::start(Arc::clone(&ctx), ctx.config.worker_count.max(1));
    ctx.install_action_queue(queue.clone());

    ensure_jobs_started(&ctx, &job_runner);

    let tick_interval = Duration::from_secs(ctx.config.tick_interval_seconds.max(1));
    loop {
        if let Err(error) = run_tick(&ctx) {
            tracing::error!(%error, "daemon tick failed");
        }
        tokio::select! {
            _ = tokio::time::sleep(tick_interval) => {}
            _ = stop_token.cancelled() => break,
        }
    }

    queue.stop();
    Ok(())
}

fn run_tick(ctx: &Arc<DaemonContext>) -> Result<(), DaemonError> {
    let fired = amon_scheduler::tick_persisted(&ctx.home, ctx.clock.now_utc())?;
    for schedule_fired in fired {
        emit_schedule_fired(ctx, schedule_fired);
    }
    ctx.drain_and_dispatch();
    Ok(())
}

fn emit_schedule_fired(ctx: &Arc<DaemonContext>, fired: ScheduleFired) {
    let mut payload = fired.vars;
    payload.insert("schedule_id".to_string(), serde_json::Value::String(fired.schedule_id.clone()));
    payload.insert("scheduled_for".to_string(), serde_json::Value::String(fired.scheduled_for));
    if let Some(template_id) = fired.template_id {
        payload.insert("template_id".to_string(), serde_json::Value::String(template_id));
    }
    let draft = EventDraft::new("schedule.fired", EventScope::Schedule, "scheduler")
        .with_payload(payload)
        .with_risk(Risk::Low);
    ctx.emit_event(draft, false);
}

/// Starts every job descriptor under `<home>/jobs/*.yaml` that isn't already
/// running. Called once at daemon startup; jobs stay up for the lifetime of
/// the process regardless of tick cadence.
fn ensure_jobs_started(ctx: &Arc<DaemonContext>, job_runner: &JobRunner) {
    let jobs_dir = ctx.home.join("jobs");
    let Ok(entries) = std::fs::read_dir(&jobs_dir) else {
        return;
    };
    let mut job_ids: Vec<String> = entries
        .flatten()
        .filter_map(|entry| job_id_from_path(&entry.path()))
        .collect();
    job_ids.sort();

    for job_id in job_ids {
        match job_runner.start_job(&job_id) {
            Ok(_) | Err(DaemonError::JobAlreadyRunning { .. }) => {}
            Err(error) => tracing::error!(job_id, %error, "failed to start job"),
        }
    }
}

fn job_id_from_path(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
        return None;
    }
    path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
}

#[cfg(test)]
#[path = "daemon_loop_tests.rs"]
mod tests;
