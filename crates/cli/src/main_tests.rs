// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use clap::error::ErrorKind;
use clap::Parser;

use crate::Cli;

#[test]
fn version_flag_short() {
    let err = Cli::try_parse_from(["amon", "-V"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn no_subcommand_is_an_error() {
    let err = Cli::try_parse_from(["amon"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingSubcommand);
}

#[test]
fn output_format_defaults_to_text() {
    let cli = Cli::try_parse_from(["amon", "hooks", "list"]).unwrap();
    assert!(matches!(cli.output, crate::output::OutputFormat::Text));
}

#[test]
fn output_flag_selects_json() {
    let cli = Cli::try_parse_from(["amon", "-o", "json", "hooks", "list"]).unwrap();
    assert!(matches!(cli.output, crate::output::OutputFormat::Json));
}

#[test]
fn binary_prints_help_via_assert_cmd() {
    use assert_cmd::Command;
    let mut cmd = Command::cargo_bin("amon").unwrap();
    cmd.arg("--help").assert().success();
}
