//! # Differential Comparison Command
//!
//! File: cli/src/commands/compare.rs
//!
//! ## Overview
//!
//! `txtar-echo compare` checks other txtar round-trip services against the
//! local implementation. For each input it computes `format(parse(input))`
//! locally, POSTs the raw input to every endpoint, and compares the response
//! bodies byte for byte. Any difference is reported with escaped previews and
//! the first differing offset.
//!
//! ## Examples
//!
//! ```bash
//! # Compare two services on a corpus of archives
//! txtar-echo compare -e http://127.0.0.1:4000 -e http://127.0.0.1:52514 corpus/*.txtar
//!
//! # Pipe a single input
//! printf -- '-- a --' | txtar-echo compare -e http://127.0.0.1:52514
//! ```
//!
//! Requests use `ureq`, a blocking client, on tokio's blocking thread pool.
//!
use crate::common::archive;
use crate::core::error::{Result, TxtarError};
use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Bytes of each input/output shown in a mismatch report.
const PREVIEW_BYTES: usize = 160;

/// Arguments for `txtar-echo compare`.
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Round-trip service URL to compare against. Repeat for several services.
    #[arg(long = "endpoint", short = 'e', required = true)]
    pub endpoints: Vec<String>,

    /// Input archives. Reads stdin when none are given.
    pub paths: Vec<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

/// One input to send: a label for reports and the raw bytes.
#[derive(Debug, Clone)]
struct Input {
    label: String,
    raw: Vec<u8>,
}

/// An endpoint response that differs from the local round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub input: String,
    pub endpoint: String,
    pub expected: Vec<u8>,
    pub actual: Vec<u8>,
}

impl Mismatch {
    /// Offset of the first differing byte. When one output is a prefix of the
    /// other this is the length of the shorter one.
    pub fn first_difference(&self) -> usize {
        first_difference(&self.expected, &self.actual)
    }
}

/// Outcome of comparing every input against every endpoint.
#[derive(Debug, Default)]
pub struct CompareReport {
    pub comparisons: usize,
    pub mismatches: Vec<Mismatch>,
}

/// # Handle Compare Command (`handle_compare`)
///
/// ## Errors
///
/// - An input cannot be read.
/// - An endpoint is unreachable or answers with a non-success status
///   (`TxtarError::Endpoint`).
/// - At least one response differs from the local output (`TxtarError::Mismatch`).
pub async fn handle_compare(args: CompareArgs) -> Result<()> {
    let inputs = read_inputs(&args.paths).await?;
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build();

    let report = compare_inputs(&agent, &args.endpoints, &inputs).await?;

    for mismatch in &report.mismatches {
        print_mismatch(mismatch, &inputs);
    }
    println!(
        "Compared {} input(s) against {} endpoint(s): {} mismatch(es).",
        inputs.len(),
        args.endpoints.len(),
        report.mismatches.len()
    );

    if !report.mismatches.is_empty() {
        return Err(TxtarError::Mismatch {
            count: report.mismatches.len(),
        }
        .into());
    }
    Ok(())
}

async fn read_inputs(paths: &[PathBuf]) -> Result<Vec<Input>> {
    if paths.is_empty() {
        let mut raw = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut raw)
            .await
            .context("Failed to read input from stdin")?;
        return Ok(vec![Input {
            label: "<stdin>".to_string(),
            raw,
        }]);
    }

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = tokio::fs::read(path).await.map_err(|e| {
            TxtarError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;
        inputs.push(Input {
            label: path.display().to_string(),
            raw,
        });
    }
    Ok(inputs)
}

/// Sends every input to every endpoint and collects the differences.
/// Stops at the first transport failure.
async fn compare_inputs(
    agent: &ureq::Agent,
    endpoints: &[String],
    inputs: &[Input],
) -> Result<CompareReport> {
    let mut report = CompareReport::default();

    for input in inputs {
        let expected = archive::roundtrip(&input.raw);
        for endpoint in endpoints {
            let actual = post_archive(agent.clone(), endpoint.clone(), input.raw.clone()).await?;
            report.comparisons += 1;

            if actual == expected {
                debug!("{} matches for {}", endpoint, input.label);
                continue;
            }
            warn!("{} differs for {}", endpoint, input.label);
            report.mismatches.push(Mismatch {
                input: input.label.clone(),
                endpoint: endpoint.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    info!(
        "Finished {} comparison(s), {} mismatch(es)",
        report.comparisons,
        report.mismatches.len()
    );
    Ok(report)
}

/// POSTs `payload` to `endpoint` and returns the full response body.
async fn post_archive(agent: ureq::Agent, endpoint: String, payload: Vec<u8>) -> Result<Vec<u8>> {
    let body = tokio::task::spawn_blocking(move || -> std::result::Result<Vec<u8>, TxtarError> {
        let endpoint_error = |message: String| TxtarError::Endpoint {
            endpoint: endpoint.clone(),
            message,
        };

        match agent.post(&endpoint).send_bytes(&payload) {
            Ok(response) => {
                let mut body = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut body)
                    .map_err(|e| endpoint_error(format!("failed to read response body: {}", e)))?;
                Ok(body)
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(endpoint_error(format!("unexpected HTTP status {}", code)))
            }
            Err(ureq::Error::Transport(err)) => Err(endpoint_error(err.to_string())),
        }
    })
    .await
    .context("Endpoint request task failed")??;

    Ok(body)
}

fn first_difference(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| left.len().min(right.len()))
}

/// Escapes non-printable bytes and truncates long text for reports.
fn preview(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(PREVIEW_BYTES)];
    let mut text = shown.escape_ascii().to_string();
    if bytes.len() > PREVIEW_BYTES {
        text.push_str("...");
    }
    text
}

fn print_mismatch(mismatch: &Mismatch, inputs: &[Input]) {
    println!("MISMATCH {} via {}", mismatch.input, mismatch.endpoint);
    if let Some(input) = inputs.iter().find(|input| input.label == mismatch.input) {
        println!("  IN  ({} bytes): {}", input.raw.len(), preview(&input.raw));
    }
    println!(
        "  LOCAL ({} bytes): {}",
        mismatch.expected.len(),
        preview(&mismatch.expected)
    );
    println!(
        "  REMOTE ({} bytes): {}",
        mismatch.actual.len(),
        preview(&mismatch.actual)
    );
    println!("  first difference at byte {}", mismatch.first_difference());
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::serve::config::ServerConfig;
    use crate::commands::serve::server_logic::{bind_listener, create_app, serve_until};
    use axum::Router;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::sync::oneshot;

    struct TestServer {
        url: String,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    async fn spawn(app: Router) -> Result<TestServer> {
        let listener = bind_listener(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 1).await?;
        let url = format!("http://{}/", listener.local_addr()?);
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve_until(listener, app, async move {
            let _ = rx.await;
        }));
        Ok(TestServer {
            url,
            shutdown: Some(tx),
        })
    }

    fn inputs() -> Vec<Input> {
        [
            ("empty", b"".as_slice()),
            ("dangling", b"note\n-- a --".as_slice()),
            ("binary", b"\x00\xff\n-- b --\n\x01".as_slice()),
        ]
        .into_iter()
        .map(|(label, raw)| Input {
            label: label.to_string(),
            raw: raw.to_vec(),
        })
        .collect()
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abd"), 2);
        assert_eq!(first_difference(b"abc", b"abc\n"), 3);
        assert_eq!(first_difference(b"", b"x"), 0);
    }

    #[test]
    fn test_preview_escapes_and_truncates() {
        assert_eq!(preview(b"a\n\x00"), "a\\n\\x00");
        let long = vec![b'x'; PREVIEW_BYTES + 10];
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.len(), PREVIEW_BYTES + 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_compare_against_local_service_matches() -> Result<()> {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let server = spawn(create_app(&config)).await?;
        let agent = ureq::AgentBuilder::new().build();

        let report = compare_inputs(&agent, &[server.url.clone()], &inputs()).await?;
        assert_eq!(report.comparisons, 3);
        assert!(report.mismatches.is_empty());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_compare_reports_differing_service() -> Result<()> {
        // Echoes the body unchanged, so it skips the marker terminator fix-up.
        let echo = Router::new().fallback(|body: axum::body::Bytes| async move { body });
        let server = spawn(echo).await?;
        let agent = ureq::AgentBuilder::new().build();

        let report = compare_inputs(&agent, &[server.url.clone()], &inputs()).await?;
        assert_eq!(report.comparisons, 3);
        assert_eq!(report.mismatches.len(), 1);

        let mismatch = &report.mismatches[0];
        assert_eq!(mismatch.input, "dangling");
        assert_eq!(mismatch.expected, b"note\n-- a --\n".to_vec());
        assert_eq!(mismatch.actual, b"note\n-- a --".to_vec());
        assert_eq!(mismatch.first_difference(), 12);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_endpoint_is_endpoint_error() -> Result<()> {
        let listener = bind_listener(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, 1).await?;
        let url = format!("http://{}/", listener.local_addr()?);
        drop(listener);

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(2))
            .build();
        let err = compare_inputs(&agent, &[url], &inputs()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxtarError>(),
            Some(TxtarError::Endpoint { .. })
        ));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_error_status_is_endpoint_error() -> Result<()> {
        let failing = Router::new().fallback(|| async {
            (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom")
        });
        let server = spawn(failing).await?;
        let agent = ureq::AgentBuilder::new().build();

        let err = compare_inputs(&agent, &[server.url.clone()], &inputs())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unexpected HTTP status 500"));
        Ok(())
    }
}
