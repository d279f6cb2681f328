//! # txtar-echo Common Modules
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by several commands. Today that is the txtar
//! archive core, which the HTTP service, `fmt` and `compare` all run.
//!

/// The txtar archive model with its parser and formatter.
pub mod archive;
