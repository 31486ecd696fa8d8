// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amon daemon` — start/stop/status for the resident `amond` process.
//!
//! There is no client/server protocol here — the chat UI
//! server and its transport live outside this core: lifecycle is a plain PID
//! file under `<home>/daemon.pid`, and `status` probes `/proc/<pid>` rather
//! than speaking to the process.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use amon_daemon::{ensure_base_structure, resolve_home_dir};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::output::OutputFormat;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background by default)
    Start {
        /// Run in the foreground, inheriting this process's stdio
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        Some(DaemonCommand::Start { foreground }) => start(foreground, format),
        Some(DaemonCommand::Stop) => stop(format),
        Some(DaemonCommand::Status) | None => status(format),
    }
}

fn pid_path() -> Result<PathBuf> {
    let home = resolve_home_dir(None)?;
    Ok(home.join("daemon.pid"))
}

fn running_pid() -> Result<Option<u32>> {
    let path = pid_path()?;
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let Ok(pid) = text.trim().parse::<u32>() else {
        return Ok(None);
    };
    if std::path::Path::new(&format!("/proc/{pid}")).exists() {
        Ok(Some(pid))
    } else {
        Ok(None)
    }
}

fn start(foreground: bool, format: OutputFormat) -> Result<()> {
    let home = resolve_home_dir(None)?;
    ensure_base_structure(&home)?;
    let binary = find_amond_binary();

    if foreground {
        let status = Command::new(&binary).status()?;
        if !status.success() {
            return Err(anyhow!("amond exited with status: {status}"));
        }
        return Ok(());
    }

    if let Some(pid) = running_pid()? {
        return emit(format, "already_running", &format!("daemon already running (pid {pid})"));
    }

    let child = Command::new(&binary)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("failed to start amond at {}: {e}", binary.display()))?;

    std::fs::write(pid_path()?, child.id().to_string())?;
    emit(format, "started", &format!("daemon started (pid {})", child.id()))
}

fn stop(format: OutputFormat) -> Result<()> {
    let Some(pid) = running_pid()? else {
        return emit(format, "not_running", "daemon not running");
    };
    let status = Command::new("kill").arg(pid.to_string()).status()?;
    if !status.success() {
        return Err(anyhow!("failed to signal pid {pid}"));
    }
    let _ = std::fs::remove_file(pid_path()?);
    emit(format, "stopped", &format!("daemon stopped (pid {pid})"))
}

fn status(format: OutputFormat) -> Result<()> {
    match running_pid()? {
        Some(pid) => emit(format, "running", &format!("daemon running (pid {pid})")),
        None => emit(format, "not_running", "daemon not running"),
    }
}

fn emit(format: OutputFormat, status: &str, text: &str) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => crate::output::print_json(&serde_json::json!({ "status": status }))?,
    }
    Ok(())
}

/// Looks for `amond` next to the running `amon` binary first (dev builds,
/// installed bundles), then falls back to `$PATH`.
fn find_amond_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("amond");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("amond")
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
