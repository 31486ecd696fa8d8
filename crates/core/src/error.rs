// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cross-cutting error taxonomy shared by every component.
//!
//! Components define their own `thiserror` enums at their public seams, but
//! every one of those enums carries an [`ErrorKind`] so callers that only
//! care about the coarse-grained failure category (to choose a retry policy,
//! an HTTP status, or a `ToolResult.meta.status` discriminator) don't need to
//! match on crate-specific variants.

use std::fmt;

/// Failure categories, not failure types: several crate-local error variants
/// may map to the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArguments,
    PolicyDenied,
    WorkspaceViolation,
    NotFound,
    TimeoutExceeded,
    Canceled,
    ExtractionFailed,
    ValidationFailed,
    ExecutionFailed,
    StoreError,
}

impl ErrorKind {
    /// The `meta.status` discriminator a `ToolResult` or run-state error field
    /// should carry for this kind.
    pub fn status_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArguments => "invalid_arguments",
            ErrorKind::PolicyDenied => "denied",
            ErrorKind::WorkspaceViolation => "workspace_violation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TimeoutExceeded => "timeout",
            ErrorKind::Canceled => "canceled",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::ExecutionFailed => "execution_failed",
            ErrorKind::StoreError => "store_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_str())
    }
}

/// Implemented by every crate-local error enum so callers can recover the
/// coarse category without matching on crate-specific variants.
pub trait HasErrorKind {
    fn kind(&self) -> ErrorKind;
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
