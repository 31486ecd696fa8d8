// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file writes (C1).
//!
//! Readers of any file written through [`atomic_write_text`] or
//! [`append_jsonl`] see either the old complete file or the new complete
//! file, never a torn write: every write lands in a sibling temp file
//! first and is renamed into place only once it's flushed, grounded on
//! `original_source/src/amon/fs/atomic.py::atomic_write_text`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::StoreError;

/// Writes `content` to `path` atomically: the parent directory is created if
/// missing, the content lands in a sibling temp file first, the temp file is
/// fsync'd, then renamed over `path`. Rename is atomic on the same
/// filesystem, so a crash mid-write leaves either the previous file or
/// nothing — never a partial file at `path` itself.
pub fn atomic_write_text(path: &Path, content: &str) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| {
        StoreError::InvalidPath(format!("path has no parent: {}", path.display()))
    })?;
    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let tmp_path = sibling_temp_path(path);
    {
        let mut tmp_file = File::create(&tmp_path).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        tmp_file
            .write_all(content.as_bytes())
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tmp_file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Convenience wrapper: serializes `value` as pretty JSON and writes it
/// atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write_text(path, &content)
}

/// Appends one JSON-serialized record as a single line to `path`, creating
/// the file and its parent directory if needed. A crash mid-append can
/// leave a truncated final line; readers (see [`crate::jsonl`]) tolerate
/// that by skipping unparseable lines rather than failing the whole file.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut line = serde_json::to_string(record).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(line.as_bytes())
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub fn read_text(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn sibling_temp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tmp");
    let unique = uuid::Uuid::new_v4();
    path.with_file_name(format!(".{file_name}.{unique}.tmp"))
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
