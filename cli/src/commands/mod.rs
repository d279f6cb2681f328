//! # txtar-echo Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the top-level commands of the CLI. Each command
//! defines its own argument struct and an async `handle_*` function that
//! `main.rs` dispatches to.
//!
//! ## Commands
//!
//! - `serve`: HTTP round-trip service
//! - `fmt`: offline canonicalisation of archive files
//! - `compare`: differential check of remote round-trip services
//!

/// Differential comparison against remote round-trip services.
pub mod compare;
/// Offline formatting and canonical-form checks.
pub mod fmt;
/// The HTTP round-trip service. Includes configuration and server logic.
pub mod serve;
