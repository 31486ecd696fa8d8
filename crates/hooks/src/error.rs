// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to read hook file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid hook YAML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("hook {hook_id} is invalid: {reason}")]
    Invalid { hook_id: String, reason: String },
    #[error(transparent)]
    Store(#[from] amon_store::StoreError),
}

impl HasErrorKind for HookError {
    fn kind(&self) -> ErrorKind {
        match self {
            HookError::Read { .. } | HookError::Parse { .. } | HookError::Invalid { .. } => {
                ErrorKind::ValidationFailed
            }
            HookError::Store(source) => source.kind(),
        }
    }
}
