// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amon-store: the atomic, crash-tolerant filesystem primitives every other
//! component builds on (C1). No component writes to disk except through
//! these functions.
//!
//! - [`atomic`] — write-to-temp-then-rename text/JSON writes and JSONL append.
//! - [`jsonl`] — tolerant JSONL reads that skip truncated trailing lines.
//! - [`path_safety`] — relative-path validation and workspace-confined
//!   canonicalization shared by the workspace guard and the job runner.

pub mod atomic;
pub mod error;
pub mod jsonl;
pub mod path_safety;

pub use atomic::{append_jsonl, atomic_write_json, atomic_write_text, read_text};
pub use error::StoreError;
pub use jsonl::{read_jsonl, read_last_jsonl};
pub use path_safety::{canonicalize_path, validate_relative_path, DEFAULT_DENY_GLOBS};
