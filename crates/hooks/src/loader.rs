// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook file loader (C3), grounded in
//! `original_source/src/amon/hooks/loader.py`.

use std::path::Path;

use crate::error::HookError;
use crate::types::Hook;

/// Parses a single hook file. `hook_id` is derived from the file stem, not
/// from anything inside the YAML body.
pub fn load_hook(path: &Path) -> Result<Hook, HookError> {
    let text = std::fs::read_to_string(path).map_err(|source| HookError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hook: Hook = serde_yaml::from_str(&text).map_err(|source| HookError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let hook_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    hook.hook_id = hook_id;
    hook.validate().map_err(|reason| HookError::Invalid {
        hook_id: hook.hook_id.clone(),
        reason,
    })?;
    Ok(hook)
}

/// Loads every `*.yaml` file under `hooks_dir`, in sorted order. A file that
/// fails to read, parse, or validate is logged and dropped — it never
/// aborts the rest of the set.
pub fn load_hooks(hooks_dir: &Path) -> Vec<Hook> {
    if !hooks_dir.is_dir() {
        return Vec::new();
    }
    let mut paths: Vec<_> = match std::fs::read_dir(hooks_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("yaml"))
            .collect(),
        Err(error) => {
            tracing::warn!(dir = %hooks_dir.display(), %error, "failed to read hooks directory");
            return Vec::new();
        }
    };
    paths.sort();

    let mut hooks = Vec::with_capacity(paths.len());
    for path in paths {
        match load_hook(&path) {
            Ok(hook) => hooks.push(hook),
            Err(error) => {
                tracing::error!(path = %path.display(), %error, "failed to load hook");
            }
        }
    }
    hooks
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
