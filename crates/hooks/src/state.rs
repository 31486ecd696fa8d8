// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook state store (C3), grounded in
//! `original_source/src/amon/hooks/state.py`.
//!
//! State is a single JSON file, read-modify-written under a coarse
//! in-process lock. Cross-process access to this file is not supported.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::HookError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookState {
    #[serde(default)]
    pub inflight: u32,
    #[serde(default)]
    pub dedupe: BTreeMap<String, String>,
    #[serde(default)]
    pub last_triggered_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HookStateFile {
    #[serde(default)]
    hooks: BTreeMap<String, HookState>,
}

/// Atomic, lock-guarded read-modify-write over `<home>/hooks/state.json`.
pub struct HookStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HookStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> HookStateFile {
        match amon_store::read_text(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => HookStateFile::default(),
        }
    }

    fn save(&self, state: &HookStateFile) -> Result<(), HookError> {
        amon_store::atomic_write_json(&self.path, state).map_err(HookError::from)
    }

    /// Returns the hook's current state, defaulting to a zeroed record
    /// without writing anything.
    pub fn get_hook_state(&self, hook_id: &str) -> HookState {
        let _guard = self.lock.lock();
        self.load().hooks.get(hook_id).cloned().unwrap_or_default()
    }

    pub fn increment_inflight(&self, hook_id: &str) -> Result<(), HookError> {
        let _guard = self.lock.lock();
        let mut state = self.load();
        let entry = state.hooks.entry(hook_id.to_string()).or_default();
        entry.inflight = entry.inflight.saturating_add(1);
        self.save(&state)
    }

    pub fn decrement_inflight(&self, hook_id: &str) -> Result<(), HookError> {
        let _guard = self.lock.lock();
        let mut state = self.load();
        let entry = state.hooks.entry(hook_id.to_string()).or_default();
        entry.inflight = entry.inflight.saturating_sub(1);
        self.save(&state)
    }

    pub fn record_trigger(
        &self,
        hook_id: &str,
        when_rfc3339: &str,
        dedupe_key: Option<&str>,
    ) -> Result<(), HookError> {
        let _guard = self.lock.lock();
        let mut state = self.load();
        let entry = state.hooks.entry(hook_id.to_string()).or_default();
        entry.last_triggered_at = Some(when_rfc3339.to_string());
        if let Some(key) = dedupe_key {
            entry.dedupe.insert(key.to_string(), when_rfc3339.to_string());
        }
        self.save(&state)
    }

    /// Clears every hook's `inflight` counter to zero. Called once by the
    /// daemon loop at startup, closing the "inflight leak on crash" gap: a
    /// worker that died mid-action never reached its decrement.
    pub fn reset_inflight_on_startup(&self) -> Result<(), HookError> {
        let _guard = self.lock.lock();
        let mut state = self.load();
        for entry in state.hooks.values_mut() {
            entry.inflight = 0;
        }
        self.save(&state)
    }
}

/// Increments a hook's `inflight` counter on construction and decrements it
/// on drop, so a panic or early return partway through dispatching an
/// action still releases the slot.
pub struct InflightGuard<'a> {
    store: &'a HookStateStore,
    hook_id: String,
}

impl<'a> InflightGuard<'a> {
    pub fn acquire(store: &'a HookStateStore, hook_id: impl Into<String>) -> Result<Self, HookError> {
        let hook_id = hook_id.into();
        store.increment_inflight(&hook_id)?;
        Ok(Self { store, hook_id })
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.store.decrement_inflight(&self.hook_id) {
            tracing::warn!(hook_id = %self.hook_id, %error, "failed to decrement inflight counter");
        }
    }
}

fn resolve_hooks_dir(home: &Path) -> PathBuf {
    home.join("hooks")
}

pub fn state_path(home: &Path) -> PathBuf {
    resolve_hooks_dir(home).join("state.json")
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
