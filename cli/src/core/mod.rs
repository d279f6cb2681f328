//! # txtar-echo Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Application-wide infrastructure used by the command modules. Currently the
//! error types and the `Result` alias live here; per-command configuration is
//! kept next to the command that owns it (e.g. `commands::serve::config`).
//!
//! ```rust
//! use crate::core::error::{Result, TxtarError};
//! ```
//!
pub mod error;
