// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time source.
//!
//! Every component that needs "now" takes `&impl Clock` rather than calling
//! `std::time`/`chrono::Utc::now()` directly, so scheduler, retry-backoff, and
//! cooldown/dedupe logic can be driven deterministically under test.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> i64;

    /// Current time as an RFC3339 string with timezone, e.g. `2026-07-27T09:00:00+00:00`.
    fn now_rfc3339(&self) -> String {
        rfc3339_from_epoch_ms(self.epoch_ms())
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.epoch_ms())
            .single()
            .unwrap_or_else(Utc::now)
    }
}

pub fn rfc3339_from_epoch_ms(epoch_ms: i64) -> String {
    Utc.timestamp_millis_opt(epoch_ms)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// when explicitly advanced.
pub struct FakeClock {
    epoch_ms: AtomicI64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            epoch_ms: AtomicI64::new(1_700_000_000_000),
        }
    }

    pub fn at(epoch_ms: i64) -> Self {
        Self {
            epoch_ms: AtomicI64::new(epoch_ms),
        }
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.epoch_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set_epoch_ms(&self, epoch_ms: i64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> i64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
