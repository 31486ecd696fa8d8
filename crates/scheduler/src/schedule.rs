// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule record (C9), grounded in
//! `original_source/src/amon/scheduler/engine.py`. Kept as one flat,
//! tolerant struct rather than a tagged enum: the original stores every
//! field on a single JSON object regardless of `type`, and type inference
//! has to run against whichever fields happen to be present.

use std::collections::BTreeMap;

use amon_core::ScheduleId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Interval,
    OneShot,
    Cron,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub schedule_id: ScheduleId,
    #[serde(rename = "type", default)]
    pub schedule_type: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub next_fire_at: Option<String>,
    #[serde(default)]
    pub last_fire_at: Option<String>,
    #[serde(default)]
    pub last_misfire_at: Option<String>,
    #[serde(default)]
    pub misfire_grace_seconds: Option<f64>,
    #[serde(default)]
    pub jitter_seconds: Option<f64>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub vars: BTreeMap<String, Value>,
    #[serde(default)]
    pub interval_seconds: Option<f64>,
    #[serde(default)]
    pub run_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cron: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Schedule {
    pub fn new(schedule_id: ScheduleId) -> Self {
        Self {
            schedule_id,
            schedule_type: None,
            enabled: true,
            created_at: None,
            updated_at: None,
            next_fire_at: None,
            last_fire_at: None,
            last_misfire_at: None,
            misfire_grace_seconds: None,
            jitter_seconds: None,
            template_id: None,
            vars: BTreeMap::new(),
            interval_seconds: None,
            run_at: None,
            status: None,
            cron: None,
        }
    }

    /// Resolves the effective schedule kind: the explicit `type` field when
    /// present and recognized, otherwise inferred from whichever
    /// type-specific field is set, defaulting to `interval`.
    pub fn kind(&self) -> ScheduleKind {
        if let Some(explicit) = self.schedule_type.as_deref() {
            match explicit.trim().to_ascii_lowercase().as_str() {
                "interval" => return ScheduleKind::Interval,
                "one_shot" | "oneshot" | "one-shot" => return ScheduleKind::OneShot,
                "cron" => return ScheduleKind::Cron,
                _ => {}
            }
        }
        if self.interval_seconds.is_some() {
            ScheduleKind::Interval
        } else if self.run_at.is_some() {
            ScheduleKind::OneShot
        } else if self.cron.is_some() {
            ScheduleKind::Cron
        } else {
            ScheduleKind::Interval
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulesFile {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
