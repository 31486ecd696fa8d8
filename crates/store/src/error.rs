// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use amon_core::{ErrorKind, HasErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    InvalidPath(String),
    #[error("path escapes workspace root: {0}")]
    WorkspaceViolation(PathBuf),
}

impl HasErrorKind for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Io { .. } | StoreError::Json { .. } => ErrorKind::StoreError,
            StoreError::InvalidPath(_) => ErrorKind::InvalidArguments,
            StoreError::WorkspaceViolation(_) => ErrorKind::WorkspaceViolation,
        }
    }
}
