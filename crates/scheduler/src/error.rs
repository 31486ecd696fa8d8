// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidCron { expr: String, reason: String },
    #[error(transparent)]
    Store(#[from] amon_store::StoreError),
}

impl HasErrorKind for SchedulerError {
    fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::InvalidCron { .. } => ErrorKind::InvalidArguments,
            SchedulerError::Store(source) => source.kind(),
        }
    }
}
