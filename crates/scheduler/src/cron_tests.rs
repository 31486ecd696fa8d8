// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};

use super::*;

fn dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).expect("valid rfc3339").with_timezone(&Utc)
}

#[test]
fn every_minute_fires_on_the_next_minute() {
    let base = dt("2026-07-27T09:00:30Z");
    let next = next_cron_after("* * * * *", base).expect("next");
    assert_eq!(next, dt("2026-07-27T09:01:00Z"));
}

#[test]
fn step_field_matches_multiples() {
    let base = dt("2026-07-27T09:00:00Z");
    let next = next_cron_after("*/15 * * * *", base).expect("next");
    assert_eq!(next, dt("2026-07-27T09:15:00Z"));
}

#[test]
fn fixed_minute_and_hour_skip_to_next_day_if_already_past() {
    let base = dt("2026-07-27T10:00:00Z");
    let next = next_cron_after("0 9 * * *", base).expect("next");
    assert_eq!(next, dt("2026-07-28T09:00:00Z"));
}

#[test]
fn day_of_week_seven_folds_to_sunday() {
    // 2026-07-26 is a Sunday.
    let base = dt("2026-07-20T00:00:00Z");
    let via_seven = next_cron_after("0 0 * * 7", base).expect("next");
    let via_zero = next_cron_after("0 0 * * 0", base).expect("next");
    assert_eq!(via_seven, via_zero);
    assert_eq!(via_seven, dt("2026-07-26T00:00:00Z"));
}

#[test]
fn malformed_expression_is_rejected() {
    let base = dt("2026-07-27T09:00:00Z");
    let error = next_cron_after("* * *", base).unwrap_err();
    assert!(matches!(error, SchedulerError::InvalidCron { .. }));
}

#[test]
fn zero_step_is_rejected() {
    let base = dt("2026-07-27T09:00:00Z");
    let error = next_cron_after("*/0 * * * *", base).unwrap_err();
    assert!(matches!(error, SchedulerError::InvalidCron { .. }));
}

#[test]
fn out_of_range_value_is_rejected() {
    let base = dt("2026-07-27T09:00:00Z");
    let error = next_cron_after("99 * * * *", base).unwrap_err();
    assert!(matches!(error, SchedulerError::InvalidCron { .. }));
}

proptest::proptest! {
    /// `* * * * *` fires every minute, so the next fire time for any base
    /// instant is always strictly later, never equal and never earlier.
    #[test]
    fn every_minute_next_fire_is_always_strictly_after_base(offset_secs in 0i64..(400 * 24 * 3600)) {
        let base = dt("2026-01-01T00:00:00Z") + chrono::Duration::seconds(offset_secs);
        let next = next_cron_after("* * * * *", base).expect("next");
        proptest::prop_assert!(next > base);
        proptest::prop_assert_eq!(next.timestamp() - base.timestamp() <= 60, true);
    }
}
