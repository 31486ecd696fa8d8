// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amon-hooks: the declarative hook loader, matcher, and state store (C3).
//!
//! Loads `<home>/hooks/*.yaml`, matches incoming events against them
//! (event type, filters, concurrency, cooldown, dedupe), and renders
//! `{{ event.<path> }}` templates in action arguments. Stops short of
//! executing or queueing actions — that's the action queue's job (C4, in
//! `amon-daemon`), which depends on this crate for matching and state.

pub mod dispatch;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod state;
pub mod template;
pub mod types;

pub use dispatch::{dispatch_event, DispatchOutcome, HookActionItem};
pub use error::HookError;
pub use loader::{load_hook, load_hooks};
pub use matcher::match_hooks;
pub use state::{state_path, HookState, HookStateStore, InflightGuard};
pub use template::render_template;
pub use types::{Hook, HookAction, HookFilter, HookPolicy};
