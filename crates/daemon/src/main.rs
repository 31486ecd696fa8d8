// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! amond — the resident Amon daemon binary.
//!
//! Normally started by `amon daemon run`; `amond` can also be invoked
//! directly for local debugging. `--once` runs a single tick (schedule
//! fire + dispatch drain) and exits rather than looping, useful for cron
//! wrappers and tests of the on-disk state the daemon leaves behind.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use amon_daemon::{ensure_base_structure, resolve_home_dir, run_daemon, run_daemon_once, DaemonContext, GlobalConfig, JobRunner};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let once = std::env::args().any(|arg| arg == "--once");

    let home = resolve_home_dir(None)?;
    ensure_base_structure(&home)?;
    let config = GlobalConfig::load(&home)?;

    let _log_guard = setup_logging(&home, &config.log_level)?;
    tracing::info!(home = %home.display(), "starting amon daemon");

    let ctx = Arc::new(DaemonContext::bootstrap(home, config));
    let job_runner = Arc::new(JobRunner::new(Arc::clone(&ctx)));

    if once {
        run_daemon_once(Arc::clone(&ctx), &job_runner).await?;
        tracing::info!("single tick complete");
        return Ok(());
    }

    let stop_token = CancellationToken::new();
    let signal_token = stop_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            signal_token.cancel();
        }
    });

    run_daemon(ctx, job_runner, stop_token).await?;
    tracing::info!("daemon stopped");
    Ok(())
}

fn setup_logging(
    home: &std::path::Path,
    log_level: &str,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = home.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "daemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
