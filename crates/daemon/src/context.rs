// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared runtime context and event log (C2), grounded in
//! `original_source/src/amon/events.py` and the `queue_emitter` closure in
//! `original_source/src/amon/daemon/__init__.py`.
//!
//! `run_daemon`'s `queue_emitter` always calls `emit_event(event,
//! dispatch_hooks=False)` and appends the payload to an in-process deque
//! that `_drain_event_queue` walks once per tick — `AMON_DISABLE_HOOK_DISPATCH`
//! is set for the whole process. `DaemonContext` reproduces that split:
//! [`DaemonContext::emit_event`] only logs and queues; [`DaemonContext::drain_and_dispatch`]
//! does the matching/enqueueing, called once per tick by the daemon loop.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use amon_core::{Clock, Event, EventDraft, EventId, IdGen, SystemClock, UuidIdGen};
use amon_hooks::{dispatch_event, DispatchOutcome, Hook, HookStateStore};
use amon_taskgraph::{FakeLlmClient, TaskGraphLlmClient};
use amon_tools::{ToolPolicy, ToolRegistry};
use parking_lot::{Mutex, RwLock};

use crate::action_queue::ActionQueue;
use crate::config::GlobalConfig;

/// Object-safe counterpart to [`amon_core::IdGen`], which cannot be made
/// into a trait object itself because it requires `Clone`.
pub trait DynIdGen: Send + Sync {
    fn next_id(&self) -> String;
}

impl<T: IdGen> DynIdGen for T {
    fn next_id(&self) -> String {
        IdGen::next(self)
    }
}

/// Everything a worker or tick needs: configuration, shared collaborators,
/// and the not-yet-dispatched event queue. Constructed once per daemon
/// process and shared behind an `Arc`.
pub struct DaemonContext {
    pub home: PathBuf,
    pub config: GlobalConfig,
    pub clock: Arc<dyn Clock>,
    pub id_gen: Arc<dyn DynIdGen>,
    pub hook_state: Arc<HookStateStore>,
    pub hooks_dir: PathBuf,
    pub hooks: RwLock<Vec<Hook>>,
    pub tool_registry: Arc<ToolRegistry>,
    pub llm_client: Arc<dyn TaskGraphLlmClient>,
    /// `false` for every in-process daemon tick, mirroring the Python
    /// daemon's hard-coded `allow_llm=False`; an operator-triggered
    /// synchronous run (C12) may construct a context with this set `true`.
    pub allow_llm: bool,
    pending_events: Mutex<VecDeque<Event>>,
    action_queue: OnceLock<ActionQueue>,
}

impl DaemonContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        home: PathBuf,
        config: GlobalConfig,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn DynIdGen>,
        hook_state: Arc<HookStateStore>,
        hooks_dir: PathBuf,
        tool_registry: Arc<ToolRegistry>,
        llm_client: Arc<dyn TaskGraphLlmClient>,
    ) -> Self {
        Self {
            home,
            config,
            clock,
            id_gen,
            hook_state,
            hooks_dir,
            hooks: RwLock::new(Vec::new()),
            tool_registry,
            llm_client,
            allow_llm: false,
            pending_events: Mutex::new(VecDeque::new()),
            action_queue: OnceLock::new(),
        }
    }

    /// Wires a production context rooted at `home`: a real clock, UUID ids,
    /// the default-tiered tool policy, and no provider transport wired in
    /// for LLM nodes (out of scope — see `amon_taskgraph::llm`). Shared by
    /// the `amond` binary and `amon daemon run`/`amon run start` so both
    /// entry points build the exact same context.
    pub fn bootstrap(home: PathBuf, config: GlobalConfig) -> Self {
        let hooks_dir = home.join("hooks");
        let hook_state = Arc::new(HookStateStore::new(amon_hooks::state_path(&home)));
        let registry = Arc::new(ToolRegistry::new(ToolPolicy::with_default_policy()));
        let id_gen: Arc<dyn DynIdGen> = Arc::new(UuidIdGen);

        Self::new(
            home,
            config,
            Arc::new(SystemClock),
            id_gen,
            hook_state,
            hooks_dir,
            registry,
            Arc::new(FakeLlmClient::always_returning("")),
        )
    }

    fn global_log_path(&self) -> PathBuf {
        self.home.join("logs").join("amon.log")
    }

    /// Installs the action queue once the daemon loop has started it.
    /// Calling this twice is a programming error and the second call is
    /// silently ignored (the first queue stays installed).
    pub fn install_action_queue(&self, queue: ActionQueue) {
        let _ = self.action_queue.set(queue);
    }

    /// Reloads `<home>/hooks/*.yaml`, replacing the in-memory hook set used
    /// by [`Self::drain_and_dispatch`].
    pub fn reload_hooks(&self) {
        let hooks = amon_hooks::load_hooks(&self.hooks_dir);
        *self.hooks.write() = hooks;
    }

    /// Assigns an id/timestamp to `draft`, appends it to the global event
    /// log, and queues it for [`Self::drain_and_dispatch`]. Never fails the
    /// caller on a log-write error: the failure is logged
    /// and the event is returned regardless.
    pub fn emit_event(&self, draft: EventDraft, _dispatch_hooks: bool) -> Event {
        let event_id = EventId::new(self.id_gen.next_id());
        let event = Event::from_draft(draft, event_id, self.clock.as_ref());
        if let Err(error) = amon_store::append_jsonl(&self.global_log_path(), &event) {
            tracing::error!(event_id = %event.event_id, %error, "failed to append event to the global log");
        }
        self.pending_events.lock().push_back(event.clone());
        event
    }

    /// Drains every event queued since the last call, matches each against
    /// the loaded hooks, and enqueues any `tool.call`/`graph.run` actions
    /// onto the installed action queue. Mirrors `_drain_event_queue`.
    pub fn drain_and_dispatch(&self) -> usize {
        let events: Vec<Event> = {
            let mut queue = self.pending_events.lock();
            queue.drain(..).collect()
        };
        let dispatched = events.len();
        let hooks = self.hooks.read().clone();
        for event in &events {
            let outcomes = dispatch_event(event, &hooks, self.clock.as_ref(), &self.hook_state, &self.hooks_dir);
            for outcome in outcomes {
                self.handle_dispatch_outcome(outcome);
            }
        }
        dispatched
    }

    fn handle_dispatch_outcome(&self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Queued { hook_id, item } => {
                let Some(queue) = self.action_queue.get() else {
                    tracing::error!(hook_id, "action queue is not installed; dropping a queued action");
                    return;
                };
                queue.enqueue_action(self.id_gen.as_ref(), item);
            }
            DispatchOutcome::Pending { hook_id } => {
                tracing::info!(hook_id, "hook action requires confirmation");
            }
            DispatchOutcome::Skipped { hook_id, reason } => {
                tracing::debug!(hook_id, reason, "hook action skipped");
            }
            DispatchOutcome::Failed { hook_id, error } => {
                tracing::error!(hook_id, error, "hook dispatch failed");
            }
        }
    }
}


#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
