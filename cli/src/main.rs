//! # txtar-echo Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Entry point for the `txtar-echo` binary. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Examples
//!
//! ```bash
//! # Run the round-trip service on an ephemeral port
//! txtar-echo -v serve --port 0
//!
//! # Canonicalise an archive
//! txtar-echo fmt < archive.txtar
//!
//! # Compare a remote implementation with the local one
//! txtar-echo compare -e http://127.0.0.1:4000 corpus/*.txtar
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command handlers (serve, fmt, compare)
mod common; // Shared modules (txtar archive core)
mod core; // Core infrastructure (errors)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "txtar-echo",
    about = "Round-trip service and tooling for txtar text archives",
    long_about = "Parses txtar archives and re-emits them in canonical form,\n\
                  over HTTP (`serve`), on local files (`fmt`), or to cross-check\n\
                  other implementations (`compare`).",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Run the HTTP round-trip service.
    #[command(alias = "s")]
    Serve(commands::serve::ServeArgs),
    /// Canonicalise archive files or stdin.
    #[command(alias = "f")]
    Fmt(commands::fmt::FmtArgs),
    /// Compare remote round-trip services with the local implementation.
    #[command(alias = "c")]
    Compare(commands::compare::CompareArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Serve(args) => commands::serve::handle_serve(args).await,
        Commands::Fmt(args) => commands::fmt::handle_fmt(args).await,
        Commands::Compare(args) => commands::compare::handle_compare(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases_resolve() {
        let cli = Cli::parse_from(["txtar-echo", "f", "--check", "a.txtar"]);
        assert!(matches!(cli.command, Commands::Fmt(ref args) if args.check));

        let cli = Cli::parse_from(["txtar-echo", "-vv", "s", "--port", "0"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Serve(ref args) if args.port == Some(0)));
    }

    #[test]
    fn test_compare_requires_endpoint() {
        assert!(Cli::try_parse_from(["txtar-echo", "compare", "a.txtar"]).is_err());
    }
}
