// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::define_id;

define_id! {
    pub struct TestId;
}

#[test]
fn new_and_as_str() {
    let id = TestId::new("abc");
    assert_eq!(id.as_str(), "abc");
}

#[test]
fn short_truncates() {
    let id = TestId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn short_passthrough_when_shorter() {
    let id = TestId::new("ab");
    assert_eq!(id.short(4), "ab");
}

#[test]
fn display_matches_inner() {
    let id = TestId::new("my-id");
    assert_eq!(id.to_string(), "my-id");
}

#[test]
fn equality_against_str() {
    let id = TestId::new("x");
    assert_eq!(id, "x".to_string().parse::<String>().unwrap().as_str());
}

#[test]
fn uuid_id_gen_produces_unique_values() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}

#[test]
fn sequential_id_gen_increments() {
    let gen = SequentialIdGen::new("evt");
    assert_eq!(gen.next(), "evt-1");
    assert_eq!(gen.next(), "evt-2");
}
