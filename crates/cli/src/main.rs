// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! amon — the operator CLI: start/stop the resident daemon, inspect loaded
//! hooks, run or cancel a TaskGraph, and manage schedules, all against the
//! same on-disk `<home>` the daemon itself reads and writes.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{daemon, hooks, run, schedule};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "amon", version, about = "Amon — local agent runtime")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon lifecycle (start/stop/status)
    Daemon(daemon::DaemonArgs),
    /// Inspect the loaded hook set and its durable state
    Hooks(hooks::HooksArgs),
    /// Start, inspect, or cancel a TaskGraph run
    Run(run::RunArgs),
    /// Manage interval/one-shot/cron schedules
    Schedule(schedule::ScheduleArgs),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run_cli().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Daemon(args) => daemon::daemon(args, cli.output).await,
        Commands::Hooks(args) => hooks::hooks(args, cli.output),
        Commands::Run(args) => run::run(args, cli.output).await,
        Commands::Schedule(args) => schedule::schedule(args, cli.output),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
