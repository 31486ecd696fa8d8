// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the daemon's own glue code (C2/C4/C10/C11/C12). Most
//! failures inside a component (hook load, tool call, graph run) are caught
//! and converted into a logged/audited outcome rather than propagated: the
//! worker never exits because of a user-code failure, so this enum is
//! smaller than the per-crate ones it wraps.

use std::path::PathBuf;

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("no home directory could be resolved (set AMON_HOME or HOME)")]
    NoHomeDir,
    #[error("job {job_id} is already running")]
    JobAlreadyRunning { job_id: String },
    #[error("job {job_id} has no descriptor at {path}")]
    JobNotFound { job_id: String, path: PathBuf },
    #[error("run {run_id} has no state file")]
    RunNotFound { run_id: String },
    #[error(transparent)]
    Store(#[from] amon_store::StoreError),
    #[error(transparent)]
    Hook(#[from] amon_hooks::HookError),
    #[error(transparent)]
    Scheduler(#[from] amon_scheduler::SchedulerError),
    #[error(transparent)]
    TaskGraph(#[from] amon_taskgraph::TaskGraphError),
    #[error("invalid config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl HasErrorKind for DaemonError {
    fn kind(&self) -> ErrorKind {
        match self {
            DaemonError::NoHomeDir => ErrorKind::InvalidArguments,
            DaemonError::JobAlreadyRunning { .. } => ErrorKind::InvalidArguments,
            DaemonError::JobNotFound { .. } => ErrorKind::NotFound,
            DaemonError::RunNotFound { .. } => ErrorKind::NotFound,
            DaemonError::Store(source) => source.kind(),
            DaemonError::Hook(source) => source.kind(),
            DaemonError::Scheduler(source) => source.kind(),
            DaemonError::TaskGraph(source) => source.kind(),
            DaemonError::Config { .. } => ErrorKind::InvalidArguments,
        }
    }
}
