//! # txtar Round-Trip Service
//!
//! File: cli/src/commands/serve/mod.rs
//!
//! ## Overview
//!
//! This module provides the HTTP service that accepts a txtar archive as the
//! request body and answers with the same archive re-formatted in canonical
//! form. It is a thin shell: the archive logic lives in `common::archive`.
//!
//! ## Architecture
//!
//! - `config.rs`: Configuration loading and validation
//! - `server_logic.rs`: Listener binding, router and request handling
//!
//! ## Examples
//!
//! ```bash
//! # Serve on the default address (127.0.0.1:52514)
//! txtar-echo serve
//!
//! # Pick an ephemeral port and disable CORS
//! txtar-echo serve --port 0 --no-cors
//!
//! # Round-trip an archive
//! curl --data-binary @archive.txtar http://127.0.0.1:52514/
//! ```
//!
use crate::core::error::Result;
use tracing::info;

pub use config::ServeArgs;

/// Handles configuration loading and merging for the round-trip service.
pub mod config;

/// Contains the Axum-based HTTP server implementation.
pub mod server_logic;

/// # Handle Serve Command (`handle_serve`)
///
/// Entry point for `txtar-echo serve`: resolves the effective configuration,
/// then runs the server until it is shut down.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);

    let config = config::load_and_merge_config(args)?;
    info!("Effective server config: {:?}", config);

    server_logic::run_server(config).await?;

    Ok(())
}
