//! # txtar-echo Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test crates in `cli/tests/`. Each test
//! file declares `mod common;` and runs the compiled `txtar-echo` binary.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;

/// Returns an `assert_cmd::Command` for the `txtar-echo` binary built for
/// this test run.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn txtar_cmd() -> Command {
    Command::cargo_bin("txtar-echo").expect("Failed to find txtar-echo binary for testing")
}

/// Path of the compiled binary, for tests that need a long-running child
/// process instead of `assert_cmd`'s run-to-completion model.
pub fn txtar_bin() -> std::path::PathBuf {
    assert_cmd::cargo::cargo_bin("txtar-echo")
}
