// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-safety primitives (C1). Every disk-touching component calls exactly
//! one of these before it writes or reads.
//!
//! `validate_relative_path` is grounded in
//! `original_source/src/amon/sandbox/path_rules.py::validate_relative_path`:
//! a pure, filesystem-free check over the path's textual form.
//! `canonicalize_path` is grounded in `original_source/src/amon/fs/safety.py`:
//! it actually touches the filesystem to resolve symlinks/`..` and confirm
//! containment under an allowed root.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Validates and normalizes a relative workspace-path declaration without
/// touching the filesystem. Rejects empty input, NUL bytes, absolute paths,
/// drive-letter prefixes, and any `.`/`..`/empty path segment.
pub fn validate_relative_path(raw: &str) -> Result<String, StoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath("path must not be empty".into()));
    }
    if trimmed.contains('\0') {
        return Err(StoreError::InvalidPath("path must not contain NUL".into()));
    }

    let normalized = trimmed.replace('\\', "/");
    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.iter().any(|p| p.is_empty() || *p == "." || *p == "..") {
        return Err(StoreError::InvalidPath(format!(
            "path contains an illegal segment: {raw}"
        )));
    }
    if normalized.starts_with('/') {
        return Err(StoreError::InvalidPath("only relative paths are allowed".into()));
    }
    if parts.first().is_some_and(|p| p.ends_with(':')) {
        return Err(StoreError::InvalidPath("drive-letter prefixes are not allowed".into()));
    }

    Ok(normalized)
}

/// The built-in deny-glob list applied on top of workspace containment,
/// verbatim from `original_source/src/amon/tooling/policy.py::_DEFAULT_DENY_GLOBS`.
pub const DEFAULT_DENY_GLOBS: &[&str] = &[
    ".env*",
    ".git/**",
    ".ssh/**",
    "*id_rsa*",
    "*.pem",
    "*.key",
    "secrets/**",
    "*secret*",
    "*token*",
];

/// Resolves `candidate` (absolute or relative) under `root`, rejecting any
/// path that escapes `root` or matches one of `deny_globs`. `root` must
/// exist; `candidate` need not.
pub fn canonicalize_path(
    root: &Path,
    candidate: &Path,
    deny_globs: &[&str],
) -> Result<PathBuf, StoreError> {
    let root_canon = root.canonicalize().map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root_canon.join(candidate)
    };

    let resolved = resolve_longest_existing_prefix(&joined)?;
    if !resolved.starts_with(&root_canon) {
        return Err(StoreError::WorkspaceViolation(resolved));
    }

    let relative = resolved
        .strip_prefix(&root_canon)
        .unwrap_or(&resolved)
        .to_string_lossy()
        .replace('\\', "/");
    for pattern in deny_globs {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| StoreError::InvalidPath(format!("invalid deny glob {pattern}: {e}")))?;
        if matcher.matches(&relative) || matcher.matches_path(Path::new(&relative)) {
            return Err(StoreError::WorkspaceViolation(resolved));
        }
    }

    Ok(resolved)
}

/// Canonicalizes the longest existing prefix of `path`, then re-appends the
/// remaining (possibly nonexistent) components — lets callers validate
/// paths for files that don't exist yet without failing on `canonicalize`.
fn resolve_longest_existing_prefix(path: &Path) -> Result<PathBuf, StoreError> {
    let mut existing = path.to_path_buf();
    let mut trailing: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if existing.exists() {
            break;
        }
        match existing.file_name() {
            Some(name) => {
                trailing.push(name.to_os_string());
                existing = existing
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("/"));
            }
            None => break,
        }
    }
    let mut resolved = existing.canonicalize().map_err(|source| StoreError::Io {
        path: existing.clone(),
        source,
    })?;
    for component in trailing.into_iter().rev() {
        resolved.push(component);
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "path_safety_tests.rs"]
mod tests;
