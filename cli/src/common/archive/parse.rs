//! # Txtar Parser
//!
//! File: cli/src/common/archive/parse.rs
//!
//! Splits raw input into the preamble and `-- name --` sections. Parsing is
//! total: every byte sequence, including empty input and binary data, maps to
//! some [`Archive`]. Anything that is not an exact marker line is content.
//!
use super::{Archive, Section, MARKER_PREFIX, MARKER_SUFFIX};

/// # Parse Archive (`parse`)
///
/// Converts `raw` into an [`Archive`].
///
/// The input is read as lines split on `\n` (a trailing unterminated fragment
/// is still a line). Lines before the first marker form the preamble; each
/// marker line opens a new section whose body collects the following lines
/// verbatim, terminators included, up to the next marker or end of input.
pub fn parse(raw: &[u8]) -> Archive {
    let mut archive = Archive::default();
    let mut current: Option<Section> = None;

    for line in raw.split_inclusive(|&byte| byte == b'\n') {
        if let Some(name) = marker_name(line) {
            if let Some(finished) = current.take() {
                archive.sections.push(finished);
            }
            current = Some(Section::new(name, Vec::new()));
            continue;
        }

        match current.as_mut() {
            Some(section) => section.body.extend_from_slice(line),
            None => archive.preamble.extend_from_slice(line),
        }
    }

    if let Some(finished) = current {
        archive.sections.push(finished);
    }
    archive
}

/// Returns the section name if `line` is a marker line.
///
/// `line` may carry its `\n` terminator. The content must start with `-- ` and
/// end with ` --` without the two overlapping, so `--  --` names an empty
/// section while `-- --` is plain text. A `\r` before the terminator is part
/// of the content and therefore defeats the suffix match.
pub(crate) fn marker_name(line: &[u8]) -> Option<&[u8]> {
    let content = line.strip_suffix(b"\n").unwrap_or(line);
    content
        .strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)
}
