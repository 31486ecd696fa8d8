// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tolerant JSONL reading: blank lines and unparseable (truncated-by-crash)
//! lines are skipped rather than failing the whole read.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Reads every well-formed JSON line from `path`. Returns an empty vec if the
/// file does not exist. Malformed lines are dropped silently — callers that
/// care should check length against expectations, not rely on an error.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            serde_json::from_str(trimmed).ok()
        })
        .collect())
}

/// Like [`read_jsonl`] but returns only the last record, if any.
pub fn read_last_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    Ok(read_jsonl(path)?.into_iter().last())
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
