// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global configuration and home-directory resolution, grounded in
//! `original_source/src/amon/config.py` (`DEFAULT_CONFIG`) and
//! `original_source/src/amon/hooks/state.py::_resolve_data_dir` /
//! `original_source/src/amon/jobs/runner.py::_resolve_data_dir`.
//!
//! The original's `DEFAULT_CONFIG` also carries LLM provider endpoints,
//! billing budgets, and skills/MCP settings — none of which this core
//! touches (no provider HTTP clients, no billing, no pluggable skill
//! surfaces). `GlobalConfig` only keeps the fields this core actually
//! consumes: tick cadence, worker pool size, default policy tiers, and
//! log level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub tick_interval_seconds: u64,
    pub worker_count: usize,
    pub log_level: String,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    pub allow: Vec<String>,
    pub ask: Vec<String>,
    pub deny: Vec<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            tick_interval_seconds: 5,
            worker_count: 1,
            log_level: "info".to_string(),
            policy: PolicyConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Loads `<home>/config.yaml`, merging onto the defaults. A missing
    /// file is not an error — every field already has a default, mirroring
    /// the original's `DEFAULT_CONFIG` merged-first behavior.
    pub fn load(home: &Path) -> Result<Self, DaemonError> {
        let path = config_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = amon_store::read_text(&path)?;
        serde_yaml::from_str(&text).map_err(|source| DaemonError::Config {
            path,
            source,
        })
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.yaml")
}

/// Resolves the Amon home directory: an explicit `override_dir` wins, then
/// the `AMON_HOME` environment variable, then `~/.amon`. Mirrors
/// `_resolve_data_dir` exactly (env var first, explicit override takes
/// precedence) per SPEC_FULL.md §3.3.
pub fn resolve_home_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, DaemonError> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var("AMON_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| DaemonError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".amon"))
}

/// Creates the directory skeleton (`hooks/`, `schedules/`, `jobs/state/`,
/// `logs/`, `projects/`) if absent. Idempotent.
pub fn ensure_base_structure(home: &Path) -> Result<(), DaemonError> {
    for sub in ["hooks", "schedules", "jobs/state", "logs", "projects"] {
        std::fs::create_dir_all(home.join(sub)).map_err(|source| amon_store::StoreError::Io {
            path: home.join(sub),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
