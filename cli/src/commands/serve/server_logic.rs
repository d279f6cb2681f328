//! # Round-Trip HTTP Server Implementation
//!
//! File: cli/src/commands/serve/server_logic.rs
//!
//! ## Overview
//!
//! This module implements the HTTP shell around the archive core. Every request,
//! whatever its method or path, has its body parsed as a txtar archive and
//! re-formatted; the formatted bytes are the response body.
//!
//! ## Architecture
//!
//! 1. Bind a `TcpListener` to the configured address (optionally falling back
//!    to the following ports when the requested one is busy)
//! 2. Build the Axum router: a single fallback handler plus body limit and
//!    tracing layers, and a CORS layer when enabled
//! 3. Serve until a shutdown future resolves (Ctrl+C / SIGTERM for the CLI,
//!    a channel in tests)
//!
//! The address is always configuration: binding port `0` yields an ephemeral
//! port, so any number of independent instances can run side by side.
//!
//! ## Failure handling
//!
//! A request body that cannot be read (too large, broken connection) is a
//! transport failure. It is logged and answered with Axum's rejection response;
//! the archive core never sees it. Parsing and formatting themselves cannot fail.
//!
use super::config::ServerConfig;
use crate::common::archive;
use crate::core::error::Result;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, error, info, trace, warn, Level};

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// # Run HTTP Server (`run_server`)
///
/// Binds the configured address, prints the startup banner and serves the
/// round-trip endpoint until Ctrl+C or SIGTERM.
///
/// ## Errors
///
/// - No port could be bound within `port_attempts` tries.
/// - The Axum server fails while running.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let listener = bind_listener(config.host, config.port, config.port_attempts).await?;
    let addr = listener
        .local_addr()
        .context("Failed to read the bound listener address")?;

    let app = create_app(&config);

    println!("\n=================================================================");
    println!("📦 txtar round-trip service");
    println!("🌐 Listening on:      http://{}", addr);
    println!("📏 Max body size:     {} bytes", config.max_body_bytes);
    println!("🔒 CORS enabled:      {}", config.enable_cors);
    println!("=================================================================\n");

    info!("Starting round-trip service on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    serve_until(listener, app, shutdown_signal()).await?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// # Serve Until Shutdown (`serve_until`)
///
/// Runs `app` on an already bound `listener` until `shutdown` resolves, then
/// lets in-flight requests finish.
pub async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;
    Ok(())
}

/// # Handle Shutdown Signal (`shutdown_signal`)
///
/// Resolves when Ctrl+C or (on Unix) SIGTERM is received. If a handler cannot
/// be installed the corresponding branch stays pending forever.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Bind Listener (`bind_listener`)
///
/// Binds `host:start_port`, trying up to `max_attempts` consecutive ports when
/// the requested one is unavailable. Port `0` is tried once. The listener that
/// bound is the one returned for serving.
///
/// ## Errors
///
/// Returns the last bind error, with context, when every attempt failed.
pub async fn bind_listener(host: IpAddr, start_port: u16, max_attempts: u8) -> Result<TcpListener> {
    let attempts = if start_port == 0 { 1 } else { max_attempts.max(1) };
    let mut last_error = None;

    for attempt in 0..attempts {
        let Some(port) = start_port.checked_add(u16::from(attempt)) else {
            break;
        };
        let addr = SocketAddr::new(host, port);

        match TcpListener::bind(addr).await {
            Ok(listener) => {
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, bound to port {} instead.",
                        start_port, port
                    );
                }
                return Ok(listener);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: could not bind {} ({}).",
                    attempt + 1,
                    addr,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    let message = format!(
        "Could not bind host {} starting from port {} after {} attempt(s)",
        host, start_port, attempts
    );
    match last_error {
        Some(e) => Err(anyhow::Error::new(e).context(message)),
        None => anyhow::bail!(message),
    }
}

/// # Create Axum Application (`create_app`)
///
/// Builds the router. The round-trip handler is installed as the fallback so
/// it answers every method on every path.
///
/// With CORS enabled, the permissive `CorsLayer` answers preflight requests
/// (`OPTIONS` carrying `Origin` and `Access-Control-Request-Method`) itself
/// and the handler never runs for them. With CORS disabled no CORS layer is
/// installed, so those requests round-trip like any other.
pub fn create_app(config: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut app = Router::new()
        .fallback(roundtrip)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    if config.enable_cors {
        debug!("CORS middleware enabled (permissive).");
        app = app.layer(CorsLayer::permissive());
    } else {
        debug!("CORS middleware disabled.");
    }

    app.layer(trace_layer)
}

/// Reads the whole body, parses it, formats the archive and returns the bytes.
async fn roundtrip(body: std::result::Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Reading request body failed: {}", rejection);
            return rejection.into_response();
        }
    };

    let parsed = archive::parse(&body);
    let output = archive::format(&parsed);
    debug!(
        input_bytes = body.len(),
        sections = parsed.sections.len(),
        output_bytes = output.len(),
        "Round-tripped archive"
    );
    trace!(
        "Section names: {:?}",
        parsed.names().map(String::from_utf8_lossy).collect::<Vec<_>>()
    );

    ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], output).into_response()
}
