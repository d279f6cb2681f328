//! # Round-Trip Service Configuration
//!
//! File: cli/src/commands/serve/config.rs
//!
//! ## Overview
//!
//! This module handles configuration loading, merging, and validation for
//! the round-trip HTTP service. It combines settings from:
//! 1. Command-line arguments, or their `TXTAR_ECHO_*` environment variables
//!    (highest priority)
//! 2. A TOML configuration file: `--config <PATH>`, or `.txtar-echo.toml`
//!    in the current directory if present
//! 3. Default values (lowest priority)
//!
//! ## Examples
//!
//! Configuration file format:
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 52514
//! max_body_bytes = 1048576
//! enable_cors = false
//! port_attempts = 5
//! ```
//!
//! Loading and merging configuration:
//!
//! ```rust
//! let config = load_and_merge_config(args)?;
//! println!("Listening on: {}:{}", config.host, config.port);
//! ```
//!
use crate::core::error::{Result, TxtarError};
use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// The name of the configuration file looked up in the current directory.
const CONFIG_FILE_NAME: &str = ".txtar-echo.toml";

/// Port of the original round-trip service.
pub const DEFAULT_PORT: u16 = 52514;

/// Largest request body read before the request is rejected.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// # Serve Command Arguments (`ServeArgs`)
///
/// Command-line arguments accepted by `txtar-echo serve`. Settings that are
/// neither passed as flags nor set in the environment come from the
/// configuration file, then from the defaults.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// IP address to bind to [default: 127.0.0.1]. Use `0.0.0.0` to accept
    /// connections on all interfaces.
    #[arg(long, env = "TXTAR_ECHO_HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on [default: 52514]. `0` binds an ephemeral port chosen
    /// by the OS.
    #[arg(long, short, env = "TXTAR_ECHO_PORT")]
    pub port: Option<u16>,

    /// Maximum accepted request body size in bytes [default: 2097152].
    #[arg(long, env = "TXTAR_ECHO_MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Disables the permissive CORS headers.
    #[arg(long)]
    pub no_cors: bool,

    /// How many consecutive ports to try when the requested one is busy
    /// [default: 1].
    #[arg(long, env = "TXTAR_ECHO_PORT_ATTEMPTS")]
    pub port_attempts: Option<u8>,

    /// Explicit configuration file. Must exist when given.
    #[arg(long, short, env = "TXTAR_ECHO_CONFIG")]
    pub config: Option<PathBuf>,
}

/// # Effective Server Configuration (`ServerConfig`)
///
/// The consolidated settings the server runs with, after merging arguments,
/// the configuration file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The network IP address the server will bind to.
    pub host: IpAddr,

    /// The port the server will listen on (`0` for ephemeral).
    pub port: u16,

    /// Request bodies above this size are rejected before parsing.
    pub max_body_bytes: usize,

    /// Whether permissive CORS headers are sent.
    pub enable_cors: bool,

    /// Number of consecutive ports tried, starting at `port`.
    pub port_attempts: u8,
}

/// # Configuration from File (`FileConfig`)
///
/// Helper struct for deserializing the TOML file. All fields are optional so
/// users only specify what they want to override.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    host: Option<String>, // Read as string so a bad address falls back with a warning
    port: Option<u16>,
    max_body_bytes: Option<usize>,
    enable_cors: Option<bool>,
    port_attempts: Option<u8>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            enable_cors: true,
            port_attempts: 1,
        }
    }
}

/// # Load and Merge Server Configuration (`load_and_merge_config`)
///
/// Determines the final server configuration.
///
/// ## Process:
/// 1. Load the configuration file: the explicit `--config` path (which must
///    exist), otherwise `.txtar-echo.toml` in the current directory if present.
/// 2. For each setting, take the argument when it was given (on the command
///    line or through its environment variable), else the file's value, else
///    the default. `--no-cors` always wins over the file.
/// 3. Validate the merged result.
///
/// ## Errors
///
/// Returns an error if:
/// - An explicitly named configuration file is missing, unreadable or invalid TOML.
/// - The implicit configuration file exists but cannot be read or parsed.
/// - The merged configuration fails validation (zero body limit or port attempts).
pub fn load_and_merge_config(args: ServeArgs) -> Result<ServerConfig> {
    let file_config = match &args.config {
        Some(path) => Some(load_config_from_path(path)?),
        None => {
            let cwd = env::current_dir().context("Failed to get current working directory")?;
            load_config_from_dir(&cwd)?
        }
    };

    let effective_config = match file_config {
        Some(file_config) => ServerConfig::from_args_over(&args, file_config),
        None => {
            debug!("No config file found or loaded. Using arguments.");
            ServerConfig::from_args(&args)
        }
    };

    effective_config.validate()?;
    Ok(effective_config)
}

/// # Load Configuration from Directory (`load_config_from_dir`)
///
/// Looks for `.txtar-echo.toml` in `search_dir`. A missing file is not an
/// error and yields `Ok(None)`.
fn load_config_from_dir(search_dir: &Path) -> Result<Option<ServerConfig>> {
    let config_path = search_dir.join(CONFIG_FILE_NAME);

    if !config_path.is_file() {
        debug!("No config file found at {}", config_path.display());
        return Ok(None);
    }

    load_config_from_path(&config_path).map(Some)
}

/// # Load Configuration from Path (`load_config_from_path`)
///
/// Reads and parses a TOML configuration file, filling unspecified settings
/// with defaults. An unparsable `host` falls back to the default with a warning.
fn load_config_from_path(config_path: &Path) -> Result<ServerConfig> {
    info!("Loading configuration from {}", config_path.display());

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let file_config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    let defaults = ServerConfig::default();

    let host = match file_config.host {
        Some(ref host_str) => host_str.parse().unwrap_or_else(|e| {
            warn!(
                "Invalid host IP '{}' in config file ({}), using default {}",
                host_str, e, defaults.host
            );
            defaults.host
        }),
        None => defaults.host,
    };

    Ok(ServerConfig {
        host,
        port: file_config.port.unwrap_or(defaults.port),
        max_body_bytes: file_config.max_body_bytes.unwrap_or(defaults.max_body_bytes),
        enable_cors: file_config.enable_cors.unwrap_or(defaults.enable_cors),
        port_attempts: file_config.port_attempts.unwrap_or(defaults.port_attempts),
    })
}

impl ServerConfig {
    /// Creates a configuration reflecting only the command-line arguments,
    /// with defaults for anything not given.
    fn from_args(args: &ServeArgs) -> Self {
        Self::from_args_over(args, Self::default())
    }

    /// Overlays the given arguments on `base`. `enable_cors` is only ever
    /// switched off, by `--no-cors`.
    fn from_args_over(args: &ServeArgs, base: Self) -> Self {
        Self {
            host: args.host.unwrap_or(base.host),
            port: args.port.unwrap_or(base.port),
            max_body_bytes: args.max_body_bytes.unwrap_or(base.max_body_bytes),
            enable_cors: base.enable_cors && !args.no_cors,
            port_attempts: args.port_attempts.unwrap_or(base.port_attempts),
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_body_bytes == 0 {
            return Err(TxtarError::Config("max_body_bytes must be greater than 0".into()).into());
        }
        if self.port_attempts == 0 {
            return Err(TxtarError::Config("port_attempts must be at least 1".into()).into());
        }
        Ok(())
    }
}
