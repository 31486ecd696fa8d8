// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amon-scheduler: the tick-driven scheduler engine (C9) — interval,
//! one-shot, and cron schedules with misfire grace, jitter, and durable
//! next-fire persistence.

pub mod cron;
pub mod engine;
pub mod error;
pub mod schedule;

pub use cron::next_cron_after;
pub use engine::{load_schedules, tick, tick_persisted, write_schedules, ScheduleFired};
pub use error::SchedulerError;
pub use schedule::{Schedule, ScheduleKind, SchedulesFile};
