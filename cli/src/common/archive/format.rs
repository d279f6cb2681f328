//! # Txtar Formatter
//!
//! File: cli/src/common/archive/format.rs
//!
//! Serializes an [`Archive`] back into its textual form. Like the parser this
//! is total: any archive, including names or bodies with embedded newlines or
//! marker-shaped text, produces output.
//!
use super::{Archive, MARKER_PREFIX, MARKER_SUFFIX};

/// # Format Archive (`format`)
///
/// Writes the preamble verbatim, then for each section a `-- name --` marker
/// line followed by the body verbatim.
///
/// Every marker starts at a line boundary: a non-empty preamble or body that
/// does not end with `\n` gets one appended before the next marker. The last
/// piece of content (final body, or the preamble of an archive with no
/// sections) is emitted exactly as stored.
pub fn format(archive: &Archive) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len_hint(archive));
    out.extend_from_slice(&archive.preamble);

    for section in &archive.sections {
        terminate_line(&mut out);
        out.extend_from_slice(MARKER_PREFIX);
        out.extend_from_slice(&section.name);
        out.extend_from_slice(MARKER_SUFFIX);
        out.push(b'\n');
        out.extend_from_slice(&section.body);
    }

    out
}

/// Ensures the next write starts at the beginning of a line.
fn terminate_line(out: &mut Vec<u8>) {
    if !out.is_empty() && !out.ends_with(b"\n") {
        out.push(b'\n');
    }
}

fn encoded_len_hint(archive: &Archive) -> usize {
    let marker_overhead = MARKER_PREFIX.len() + MARKER_SUFFIX.len() + 2;
    archive.preamble.len()
        + archive
            .sections
            .iter()
            .map(|section| section.name.len() + section.body.len() + marker_overhead)
            .sum::<usize>()
}
