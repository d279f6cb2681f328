//! # Archive Formatting Command
//!
//! File: cli/src/commands/fmt.rs
//!
//! ## Overview
//!
//! `txtar-echo fmt` runs the same parse → format round trip as the HTTP
//! service, but on local files or stdin. It can print, rewrite in place, or
//! only check that archives are already canonical.
//!
//! ## Examples
//!
//! ```bash
//! # Canonicalise stdin to stdout
//! txtar-echo fmt < testdata/basic.txtar
//!
//! # Rewrite files in place
//! txtar-echo fmt --write testdata/*.txtar
//!
//! # Fail (and list offenders) if anything would change
//! txtar-echo fmt --check testdata/*.txtar
//! ```
//!
use crate::common::archive;
use crate::core::error::{Result, TxtarError};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

/// Arguments for `txtar-echo fmt`.
#[derive(Parser, Debug)]
pub struct FmtArgs {
    /// Archive files to format. Reads stdin when none are given.
    pub paths: Vec<PathBuf>,

    /// Rewrite files in place instead of printing them.
    #[arg(long, short, conflicts_with = "check")]
    pub write: bool,

    /// Only report archives that are not in canonical form.
    #[arg(long)]
    pub check: bool,
}

/// What to do with each formatted archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Print,
    Write,
    Check,
}

impl From<&FmtArgs> for Mode {
    fn from(args: &FmtArgs) -> Self {
        if args.check {
            Mode::Check
        } else if args.write {
            Mode::Write
        } else {
            Mode::Print
        }
    }
}

/// # Handle Fmt Command (`handle_fmt`)
///
/// ## Errors
///
/// - `--write` without any paths.
/// - An input cannot be read, or a rewritten file cannot be written.
/// - In `--check` mode, at least one archive is not canonical
///   (`TxtarError::NotCanonical`).
pub async fn handle_fmt(args: FmtArgs) -> Result<()> {
    let mode = Mode::from(&args);
    debug!("Formatting {} path(s) in {:?} mode", args.paths.len(), mode);

    if args.paths.is_empty() {
        return format_stdin(mode).await;
    }

    let mut not_canonical = 0;
    for path in &args.paths {
        if !format_file(path, mode).await? {
            not_canonical += 1;
        }
    }

    if not_canonical > 0 {
        return Err(TxtarError::NotCanonical {
            count: not_canonical,
        }
        .into());
    }
    Ok(())
}

async fn format_stdin(mode: Mode) -> Result<()> {
    if mode == Mode::Write {
        return Err(
            TxtarError::ArgumentParsing("--write requires at least one file path".into()).into(),
        );
    }

    let mut raw = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut raw)
        .await
        .context("Failed to read archive from stdin")?;

    if mode == Mode::Check {
        if !archive::is_canonical_bytes(&raw) {
            println!("<stdin>");
            return Err(TxtarError::NotCanonical { count: 1 }.into());
        }
        return Ok(());
    }

    write_stdout(&archive::roundtrip(&raw)).await
}

/// Formats one file according to `mode`. Returns `false` only in check mode
/// when the file is not canonical.
async fn format_file(path: &Path, mode: Mode) -> Result<bool> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| TxtarError::FileSystem(format!("Failed to read {}: {}", path.display(), e)))?;
    if mode == Mode::Check {
        if archive::is_canonical_bytes(&raw) {
            return Ok(true);
        }
        println!("{}", path.display());
        return Ok(false);
    }

    let formatted = archive::roundtrip(&raw);
    if mode == Mode::Print {
        write_stdout(&formatted).await?;
    } else if formatted != raw {
        tokio::fs::write(path, &formatted).await.map_err(|e| {
            TxtarError::FileSystem(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!("Reformatted {}", path.display());
    } else {
        debug!("{} is already canonical", path.display());
    }
    Ok(true)
}

async fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(bytes)
        .await
        .context("Failed to write archive to stdout")?;
    stdout.flush().await.context("Failed to flush stdout")?;
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(paths: Vec<PathBuf>, write: bool, check: bool) -> FmtArgs {
        FmtArgs { paths, write, check }
    }

    #[test]
    fn test_mode_from_args() {
        assert_eq!(Mode::from(&args(vec![], false, false)), Mode::Print);
        assert_eq!(Mode::from(&args(vec![], true, false)), Mode::Write);
        assert_eq!(Mode::from(&args(vec![], false, true)), Mode::Check);
    }

    #[test]
    fn test_write_conflicts_with_check() {
        assert!(FmtArgs::try_parse_from(["fmt", "--write", "--check", "a.txtar"]).is_err());
    }

    #[tokio::test]
    async fn test_write_rewrites_only_changed_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dangling = temp_dir.path().join("dangling.txtar");
        let canonical = temp_dir.path().join("canonical.txtar");
        fs::write(&dangling, "note\n-- a --")?;
        fs::write(&canonical, "-- a --\nbody\n")?;

        handle_fmt(args(vec![dangling.clone(), canonical.clone()], true, false)).await?;

        assert_eq!(fs::read(&dangling)?, b"note\n-- a --\n".to_vec());
        assert_eq!(fs::read(&canonical)?, b"-- a --\nbody\n".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn test_check_counts_non_canonical_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let good = temp_dir.path().join("good.txtar");
        let bad = temp_dir.path().join("bad.txtar");
        fs::write(&good, "hello\nworld\n")?;
        fs::write(&bad, "-- trailing marker --")?;

        let err = handle_fmt(args(vec![good.clone(), bad.clone()], false, true))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxtarError>(),
            Some(TxtarError::NotCanonical { count: 1 })
        ));
        // Check mode never writes.
        assert_eq!(fs::read(&bad)?, b"-- trailing marker --".to_vec());

        handle_fmt(args(vec![good], false, true)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_check_agrees_with_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cases: [(&str, &[u8]); 4] = [
            ("binary.txtar", b"\xff\n-- \x80 --\n\x00"),
            ("no_final_newline.txtar", b"comment\n-- a --\nbody"),
            ("dangling_marker.txtar", b"comment\n-- a --"),
            ("padded_name.txtar", b"--  --\n-- a--\n"),
        ];
        for (name, raw) in cases {
            let path = temp_dir.path().join(name);
            fs::write(&path, raw)?;
            let canonical = format_file(&path, Mode::Check).await?;
            assert_eq!(canonical, archive::roundtrip(raw) == raw, "{}", name);
            // Check mode leaves the file alone either way.
            assert_eq!(fs::read(&path)?, raw.to_vec());
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_filesystem_error() {
        let err = handle_fmt(args(
            vec![PathBuf::from("/path/that/definitely/does/not/exist.txtar")],
            false,
            false,
        ))
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxtarError>(),
            Some(TxtarError::FileSystem(_))
        ));
    }

    #[tokio::test]
    async fn test_write_without_paths_is_rejected() {
        let err = handle_fmt(args(vec![], true, false)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxtarError>(),
            Some(TxtarError::ArgumentParsing(_))
        ));
    }
}
