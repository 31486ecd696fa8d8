// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand-rolled 5-field cron parser and next-fire search, grounded in
//! `original_source/src/amon/scheduler/engine.py::_parse_cron_expression` /
//! `_next_cron_after`. No general cron crate: the grammar is deliberately
//! restricted to `*`, `*/N`, and bare integers.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::error::SchedulerError;

/// Minute-by-minute search window: a year of minutes plus slack, matching
/// the original's `60 * 24 * 366` bound.
const MAX_STEPS: u32 = 60 * 24 * 366;

struct CronFields {
    minute: BTreeSet<u32>,
    hour: BTreeSet<u32>,
    day_of_month: BTreeSet<u32>,
    month: BTreeSet<u32>,
    day_of_week: BTreeSet<u32>,
}

fn parse_field(field: &str, min: u32, max: u32, label: &str) -> Result<BTreeSet<u32>, SchedulerError> {
    let field = field.trim();
    if field == "*" {
        return Ok((min..=max).collect());
    }
    if let Some(step_str) = field.strip_prefix("*/") {
        let step: u32 = step_str.parse().map_err(|_| SchedulerError::InvalidCron {
            expr: field.to_string(),
            reason: format!("invalid {label} step"),
        })?;
        if step == 0 {
            return Err(SchedulerError::InvalidCron {
                expr: field.to_string(),
                reason: format!("{label} step must be greater than 0"),
            });
        }
        return Ok((min..=max).step_by(step as usize).collect());
    }
    if let Ok(mut value) = field.parse::<u32>() {
        if label == "day_of_week" && value == 7 {
            value = 0;
        }
        if value < min || value > max {
            return Err(SchedulerError::InvalidCron {
                expr: field.to_string(),
                reason: format!("{label} out of range"),
            });
        }
        let mut set = BTreeSet::new();
        set.insert(value);
        return Ok(set);
    }
    Err(SchedulerError::InvalidCron {
        expr: field.to_string(),
        reason: format!("unsupported {label} format"),
    })
}

fn parse_expression(expr: &str) -> Result<CronFields, SchedulerError> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(SchedulerError::InvalidCron {
            expr: expr.to_string(),
            reason: "cron expression must have 5 fields".to_string(),
        });
    }
    Ok(CronFields {
        minute: parse_field(parts[0], 0, 59, "minute")?,
        hour: parse_field(parts[1], 0, 23, "hour")?,
        day_of_month: parse_field(parts[2], 1, 31, "day_of_month")?,
        month: parse_field(parts[3], 1, 12, "month")?,
        day_of_week: parse_field(parts[4], 0, 6, "day_of_week")?,
    })
}

/// Sunday=0..Saturday=6, matching `_cron_weekday`'s fold of chrono's
/// Monday=0..Sunday=6 week.
fn cron_weekday(candidate: &DateTime<Utc>) -> u32 {
    (candidate.weekday().num_days_from_monday() + 1) % 7
}

/// Finds the first minute-aligned instant strictly after `base` that
/// satisfies every field of `expr`, searching at most one year ahead.
pub fn next_cron_after(expr: &str, base: DateTime<Utc>) -> Result<DateTime<Utc>, SchedulerError> {
    let fields = parse_expression(expr)?;
    let mut candidate = base
        .with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(base)
        + Duration::minutes(1);

    for _ in 0..MAX_STEPS {
        if fields.minute.contains(&candidate.minute())
            && fields.hour.contains(&candidate.hour())
            && fields.day_of_month.contains(&candidate.day())
            && fields.month.contains(&candidate.month())
            && fields.day_of_week.contains(&cron_weekday(&candidate))
        {
            return Ok(candidate);
        }
        candidate += Duration::minutes(1);
    }

    Err(SchedulerError::InvalidCron {
        expr: expr.to_string(),
        reason: "no matching time found within search window".to_string(),
    })
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
