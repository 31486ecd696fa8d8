// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amon schedule` — manage `<home>/schedules/schedules.json` and force a
//! tick for debugging, per C9.

use std::collections::BTreeMap;

use amon_core::ScheduleId;
use amon_daemon::resolve_home_dir;
use amon_scheduler::{load_schedules, tick_persisted, write_schedules, Schedule};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// List every schedule
    List,
    /// Add an interval schedule
    AddInterval {
        schedule_id: String,
        /// Fire every N seconds
        #[arg(long)]
        seconds: f64,
        #[arg(long)]
        template: Option<String>,
    },
    /// Add a one-shot schedule
    AddOnce {
        schedule_id: String,
        /// RFC3339 timestamp to fire at
        #[arg(long)]
        run_at: String,
        #[arg(long)]
        template: Option<String>,
    },
    /// Add a cron schedule (5 fields: minute hour day-of-month month day-of-week)
    AddCron {
        schedule_id: String,
        #[arg(long)]
        cron: String,
        #[arg(long)]
        template: Option<String>,
    },
    /// Remove a schedule
    Remove { schedule_id: String },
    /// Advance every schedule by one tick now, without waiting for the daemon
    Tick,
}

pub fn schedule(args: ScheduleArgs, format: OutputFormat) -> Result<()> {
    let home = resolve_home_dir(None)?;
    std::fs::create_dir_all(home.join("schedules"))?;
    match args.command {
        ScheduleCommand::List => list(&home, format),
        ScheduleCommand::AddInterval { schedule_id, seconds, template } => {
            add(&home, schedule_id, template, |s| s.interval_seconds = Some(seconds), format)
        }
        ScheduleCommand::AddOnce { schedule_id, run_at, template } => {
            add(&home, schedule_id, template, |s| s.run_at = Some(run_at.clone()), format)
        }
        ScheduleCommand::AddCron { schedule_id, cron, template } => {
            add(&home, schedule_id, template, |s| s.cron = Some(cron.clone()), format)
        }
        ScheduleCommand::Remove { schedule_id } => remove(&home, &schedule_id, format),
        ScheduleCommand::Tick => tick(&home, format),
    }
}

fn list(home: &std::path::Path, format: OutputFormat) -> Result<()> {
    let file = load_schedules(home)?;
    match format {
        OutputFormat::Text => {
            if file.schedules.is_empty() {
                println!("No schedules.");
                return Ok(());
            }
            for schedule in &file.schedules {
                println!(
                    "{:<20} {:<9} enabled={:<5} next_fire_at={}",
                    schedule.schedule_id.as_str(),
                    format!("{:?}", schedule.kind()).to_lowercase(),
                    schedule.enabled,
                    schedule.next_fire_at.as_deref().unwrap_or("-"),
                );
            }
        }
        OutputFormat::Json => crate::output::print_json(&serde_json::to_value(&file)?)?,
    }
    Ok(())
}

fn add(
    home: &std::path::Path,
    schedule_id: String,
    template: Option<String>,
    apply: impl FnOnce(&mut Schedule),
    format: OutputFormat,
) -> Result<()> {
    let mut file = load_schedules(home)?;
    if file.schedules.iter().any(|s| s.schedule_id.as_str() == schedule_id) {
        return Err(anyhow!("schedule {schedule_id} already exists"));
    }
    let mut schedule = Schedule::new(ScheduleId::new(schedule_id.clone()));
    schedule.template_id = template;
    schedule.created_at = Some(chrono::Utc::now().to_rfc3339());
    apply(&mut schedule);
    file.schedules.push(schedule);
    write_schedules(home, &file)?;

    match format {
        OutputFormat::Text => println!("schedule added: {schedule_id}"),
        OutputFormat::Json => crate::output::print_json(&serde_json::json!({ "schedule_id": schedule_id }))?,
    }
    Ok(())
}

fn remove(home: &std::path::Path, schedule_id: &str, format: OutputFormat) -> Result<()> {
    let mut file = load_schedules(home)?;
    let before = file.schedules.len();
    file.schedules.retain(|s| s.schedule_id.as_str() != schedule_id);
    if file.schedules.len() == before {
        return Err(anyhow!("schedule {schedule_id} not found"));
    }
    write_schedules(home, &file)?;

    match format {
        OutputFormat::Text => println!("schedule removed: {schedule_id}"),
        OutputFormat::Json => crate::output::print_json(&serde_json::json!({ "schedule_id": schedule_id, "removed": true }))?,
    }
    Ok(())
}

fn tick(home: &std::path::Path, format: OutputFormat) -> Result<()> {
    let fired = tick_persisted(home, chrono::Utc::now())?;
    let payloads: Vec<BTreeMap<&str, String>> = fired
        .iter()
        .map(|f| {
            let mut m = BTreeMap::new();
            m.insert("schedule_id", f.schedule_id.clone());
            m.insert("scheduled_for", f.scheduled_for.clone());
            m.insert("fired_at", f.fired_at.clone());
            m
        })
        .collect();

    match format {
        OutputFormat::Text => {
            if fired.is_empty() {
                println!("No schedules fired.");
            }
            for f in &fired {
                println!("fired: {} scheduled_for={}", f.schedule_id, f.scheduled_for);
            }
        }
        OutputFormat::Json => crate::output::print_json(&serde_json::json!({ "fired": payloads }))?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
