// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tick-driven scheduler engine (C9), grounded in
//! `original_source/src/amon/scheduler/engine.py`.
//!
//! [`tick`] is a pure function over `&mut [Schedule]` so it can be driven
//! deterministically under test; [`tick_persisted`] adds the atomic
//! load/save side effect the daemon loop actually calls each iteration.
//! Emitting `schedule.fired` events into the event log (C2) is the caller's
//! job — this crate only decides *that* a schedule fired and returns the
//! payload, to avoid a dependency from the scheduler back onto the event
//! log's owning crate.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng as _;
use serde::Serialize;
use serde_json::Value;

use crate::cron::next_cron_after;
use crate::error::SchedulerError;
use crate::schedule::{Schedule, ScheduleKind, SchedulesFile};

/// The payload of one `schedule.fired` event, ready for the caller to wrap
/// in an `EventDraft`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleFired {
    pub schedule_id: String,
    pub template_id: Option<String>,
    pub vars: BTreeMap<String, Value>,
    pub scheduled_for: String,
    pub fired_at: String,
}

fn format_ts(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn is_misfire(schedule: &Schedule, now: DateTime<Utc>, due_at: DateTime<Utc>) -> bool {
    let grace = schedule.misfire_grace_seconds.unwrap_or(0.0);
    if grace <= 0.0 {
        return false;
    }
    (now - due_at).num_milliseconds() as f64 / 1000.0 > grace
}

fn apply_jitter(next_fire: DateTime<Utc>, schedule: &Schedule) -> DateTime<Utc> {
    let jitter = schedule.jitter_seconds.unwrap_or(0.0);
    if jitter <= 0.0 {
        return next_fire;
    }
    let offset_seconds = rand::rng().random_range(0.0..jitter);
    next_fire + Duration::milliseconds((offset_seconds * 1000.0) as i64)
}

fn fire(schedule: &Schedule, scheduled_for: DateTime<Utc>, now: DateTime<Utc>) -> ScheduleFired {
    ScheduleFired {
        schedule_id: schedule.schedule_id.as_str().to_string(),
        template_id: schedule.template_id.clone(),
        vars: schedule.vars.clone(),
        scheduled_for: format_ts(scheduled_for),
        fired_at: format_ts(now),
    }
}

fn resolve_next_fire_at(schedule: &Schedule, interval_seconds: f64) -> Option<DateTime<Utc>> {
    if let Some(next_fire) = parse_ts(schedule.next_fire_at.as_deref()) {
        return Some(next_fire);
    }
    if let Some(last_fire) = parse_ts(schedule.last_fire_at.as_deref()) {
        return Some(last_fire + Duration::milliseconds((interval_seconds * 1000.0) as i64));
    }
    if let Some(created_at) = parse_ts(schedule.created_at.as_deref()) {
        return Some(created_at + Duration::milliseconds((interval_seconds * 1000.0) as i64));
    }
    None
}

fn advance_interval(due_at: DateTime<Utc>, now: DateTime<Utc>, interval_seconds: f64) -> DateTime<Utc> {
    let step = Duration::milliseconds((interval_seconds * 1000.0) as i64);
    let mut next_fire = due_at + step;
    while next_fire <= now {
        next_fire += step;
    }
    next_fire
}

fn process_interval(schedule: &mut Schedule, now: DateTime<Utc>) -> (Vec<ScheduleFired>, bool) {
    let Some(interval_seconds) = schedule.interval_seconds.filter(|s| *s > 0.0) else {
        tracing::warn!(schedule_id = %schedule.schedule_id, "interval schedule missing interval_seconds");
        return (Vec::new(), false);
    };

    let Some(due_at) = resolve_next_fire_at(schedule, interval_seconds) else {
        return (Vec::new(), false);
    };
    if now < due_at {
        return (Vec::new(), false);
    }

    let mut fired = Vec::new();
    if is_misfire(schedule, now, due_at) {
        schedule.last_misfire_at = Some(format_ts(now));
    } else {
        fired.push(fire(schedule, due_at, now));
        schedule.last_fire_at = Some(format_ts(now));
    }
    let next = advance_interval(due_at, now, interval_seconds);
    schedule.next_fire_at = Some(format_ts(apply_jitter(next, schedule)));
    schedule.updated_at = Some(format_ts(now));
    (fired, true)
}

fn process_one_shot(schedule: &mut Schedule, now: DateTime<Utc>) -> (Vec<ScheduleFired>, bool) {
    if matches!(schedule.status.as_deref(), Some("completed") | Some("misfired")) {
        return (Vec::new(), false);
    }

    // Resolution order: `run_at`, then `next_fire_at`, then `created_at` —
    // a one-shot with neither an explicit `run_at` nor a persisted
    // `next_fire_at` is treated as due immediately, not as malformed.
    let due_at = parse_ts(schedule.run_at.as_deref())
        .or_else(|| parse_ts(schedule.next_fire_at.as_deref()))
        .or_else(|| parse_ts(schedule.created_at.as_deref()))
        .unwrap_or(now);

    if now < due_at {
        return (Vec::new(), false);
    }

    let mut fired = Vec::new();
    if is_misfire(schedule, now, due_at) {
        schedule.status = Some("misfired".to_string());
        schedule.last_misfire_at = Some(format_ts(now));
    } else {
        fired.push(fire(schedule, due_at, now));
        schedule.status = Some("completed".to_string());
        schedule.last_fire_at = Some(format_ts(now));
    }
    schedule.next_fire_at = None;
    schedule.enabled = false;
    schedule.updated_at = Some(format_ts(now));
    (fired, true)
}

fn process_cron(schedule: &mut Schedule, now: DateTime<Utc>) -> (Vec<ScheduleFired>, bool) {
    let Some(cron_expr) = schedule.cron.clone().filter(|s| !s.trim().is_empty()) else {
        tracing::warn!(schedule_id = %schedule.schedule_id, "cron schedule missing cron expression");
        return (Vec::new(), false);
    };

    let due_at = match parse_ts(schedule.next_fire_at.as_deref()) {
        Some(due_at) => due_at,
        None => match next_cron_after(&cron_expr, now - Duration::minutes(1)) {
            Ok(due_at) => due_at,
            Err(error) => {
                tracing::error!(schedule_id = %schedule.schedule_id, %error, "failed to parse cron expression");
                schedule.status = Some("invalid".to_string());
                schedule.updated_at = Some(format_ts(now));
                return (Vec::new(), true);
            }
        },
    };

    if now < due_at {
        let next_fire_at = format_ts(due_at);
        if schedule.next_fire_at.as_deref() != Some(next_fire_at.as_str()) {
            schedule.next_fire_at = Some(next_fire_at);
            schedule.updated_at = Some(format_ts(now));
            return (Vec::new(), true);
        }
        return (Vec::new(), false);
    }

    let mut fired = Vec::new();
    if is_misfire(schedule, now, due_at) {
        schedule.last_misfire_at = Some(format_ts(now));
    } else {
        fired.push(fire(schedule, due_at, now));
        schedule.last_fire_at = Some(format_ts(now));
    }
    match next_cron_after(&cron_expr, std::cmp::max(now, due_at)) {
        Ok(next) => schedule.next_fire_at = Some(format_ts(apply_jitter(next, schedule))),
        Err(error) => {
            tracing::error!(schedule_id = %schedule.schedule_id, %error, "failed to compute next cron fire time");
            schedule.status = Some("invalid".to_string());
            schedule.next_fire_at = None;
        }
    }
    schedule.updated_at = Some(format_ts(now));
    (fired, true)
}

fn process_schedule(schedule: &mut Schedule, now: DateTime<Utc>) -> (Vec<ScheduleFired>, bool) {
    if !schedule.enabled {
        return (Vec::new(), false);
    }
    match schedule.kind() {
        ScheduleKind::Interval => process_interval(schedule, now),
        ScheduleKind::OneShot => process_one_shot(schedule, now),
        ScheduleKind::Cron => process_cron(schedule, now),
    }
}

/// Advances every enabled schedule by one tick, returning the events that
/// fired and whether any schedule mutated (the caller persists when true).
pub fn tick(schedules: &mut [Schedule], now: DateTime<Utc>) -> (Vec<ScheduleFired>, bool) {
    let mut fired_events = Vec::new();
    let mut updated = false;
    for schedule in schedules {
        let (fired, schedule_updated) = process_schedule(schedule, now);
        fired_events.extend(fired);
        updated |= schedule_updated;
    }
    (fired_events, updated)
}

fn schedules_path(home: &Path) -> std::path::PathBuf {
    home.join("schedules").join("schedules.json")
}

pub fn load_schedules(home: &Path) -> Result<SchedulesFile, SchedulerError> {
    let path = schedules_path(home);
    if !path.exists() {
        return Ok(SchedulesFile::default());
    }
    let text = amon_store::read_text(&path)?;
    Ok(serde_json::from_str(&text).unwrap_or_default())
}

pub fn write_schedules(home: &Path, file: &SchedulesFile) -> Result<(), SchedulerError> {
    amon_store::atomic_write_json(&schedules_path(home), file).map_err(SchedulerError::from)
}

/// Loads `<home>/schedules/schedules.json`, ticks every schedule, and
/// persists atomically if anything mutated.
pub fn tick_persisted(home: &Path, now: DateTime<Utc>) -> Result<Vec<ScheduleFired>, SchedulerError> {
    let mut file = load_schedules(home)?;
    let (fired, updated) = tick(&mut file.schedules, now);
    if updated {
        write_schedules(home, &file)?;
    }
    Ok(fired)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
