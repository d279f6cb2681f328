//! # txtar-echo Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used by the command layer of the
//! application. The archive core (`common::archive`) has no error type at all:
//! parsing and formatting are total. Everything that can fail lives around it:
//! reading configuration, touching the filesystem, talking to remote endpoints.
//!
//! ## Architecture
//!
//! - `TxtarError`: a `thiserror` enum for failures callers may want to match on
//! - `Result<T>`: an alias for `anyhow::Result<T>` used for propagation with context
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if config.max_body_bytes == 0 {
//!     return Err(TxtarError::Config("max_body_bytes must be positive".into()).into());
//! }
//!
//! // Add context to errors using anyhow
//! let raw = fs::read(&path)
//!     .with_context(|| format!("Failed to read archive: {}", path.display()))?;
//! ```
//!
use thiserror::Error;

/// Custom error type for txtar-echo.
#[derive(Error, Debug)]
pub enum TxtarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Endpoint '{endpoint}' failed: {message}")]
    Endpoint { endpoint: String, message: String },

    #[error("{count} archive(s) are not in canonical form.")]
    NotCanonical { count: usize },

    #[error("{count} endpoint response(s) differ from the local round trip.")]
    Mismatch { count: usize },

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = TxtarError::Config("port_attempts must be at least 1".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: port_attempts must be at least 1"
        );

        let endpoint_err = TxtarError::Endpoint {
            endpoint: "http://127.0.0.1:9".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            endpoint_err.to_string(),
            "Endpoint 'http://127.0.0.1:9' failed: connection refused"
        );

        assert_eq!(
            TxtarError::NotCanonical { count: 2 }.to_string(),
            "2 archive(s) are not in canonical form."
        );
        assert_eq!(
            TxtarError::Mismatch { count: 1 }.to_string(),
            "1 endpoint response(s) differ from the local round trip."
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = TxtarError::Mismatch { count: 3 }.into();
        let err = err.context("compare failed");
        assert!(matches!(
            err.downcast_ref::<TxtarError>(),
            Some(TxtarError::Mismatch { count: 3 })
        ));
    }
}
