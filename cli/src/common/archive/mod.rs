//! # Txtar Archive Core (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! This module holds the in-memory model of a txtar archive and the two
//! operations every other part of the application is built on:
//!
//! - **`parse`**: raw bytes → [`Archive`]. Total; malformed input is just text.
//! - **`format`**: [`Archive`] → raw bytes in the canonical textual form.
//!
//! ## Format
//!
//! ```text
//! <preamble text, zero or more lines>
//! -- name-of-section-1 --
//! <body lines of section 1>
//! -- name-of-section-2 --
//! <body lines of section 2>
//! ```
//!
//! A marker line is exactly `-- `, the name, ` --`, then end of line. There is
//! no escaping, so a body that itself contains a marker-shaped line re-parses
//! as two sections. That is an accepted property of the format.
//!
//! ## Representation
//!
//! Names, bodies and the preamble are kept as raw bytes rather than `String`.
//! The parser never rejects input, and canonical input must survive a round
//! trip byte for byte, including input that is not valid UTF-8. Use the
//! `*_lossy` accessors for display.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive;
//!
//! let parsed = archive::parse(b"notes\n-- a.txt --\nhello\n");
//! assert_eq!(parsed.sections.len(), 1);
//! assert_eq!(archive::format(&parsed), b"notes\n-- a.txt --\nhello\n");
//! ```
//!
use std::borrow::Cow;
use std::fmt;

pub mod format;
pub mod parse;

pub use format::format;
pub use parse::parse;

/// Literal that opens a marker line.
pub const MARKER_PREFIX: &[u8] = b"-- ";
/// Literal that closes a marker line.
pub const MARKER_SUFFIX: &[u8] = b" --";

/// A parsed txtar archive: free-form preamble followed by named sections.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Archive {
    /// Everything before the first marker line, terminators included.
    pub preamble: Vec<u8>,
    /// Sections in source order. Duplicate names are kept as separate entries.
    pub sections: Vec<Section>,
}

/// One `-- name --` delimited block of an archive.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// The text between the marker delimiters, untrimmed.
    pub name: Vec<u8>,
    /// Every line after the marker up to the next marker or end of input.
    pub body: Vec<u8>,
}

impl Section {
    pub fn new(name: impl Into<Vec<u8>>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl Archive {
    #[cfg(test)]
    pub fn new(preamble: impl Into<Vec<u8>>) -> Self {
        Self {
            preamble: preamble.into(),
            sections: Vec::new(),
        }
    }

    /// Appends a section, builder style.
    #[cfg(test)]
    pub fn with_section(mut self, name: impl Into<Vec<u8>>, body: impl Into<Vec<u8>>) -> Self {
        self.sections.push(Section::new(name, body));
        self
    }

    pub fn preamble_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.preamble)
    }

    /// Iterates over section names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.sections.iter().map(|section| section.name.as_slice())
    }

    /// # Canonical Form Check (`is_canonical`)
    ///
    /// Returns `true` when `parse(format(self))` is guaranteed to equal `self`.
    ///
    /// That requires:
    /// - no section name contains a line feed,
    /// - neither the preamble nor any body contains a marker-shaped line,
    /// - the preamble (when sections follow) and every non-final, non-empty
    ///   body end with a line feed, so the formatter has nothing to inject.
    ///
    /// The final body, or the preamble of a section-less archive, may end
    /// without a terminator since it is emitted as stored.
    ///
    /// Model-level counterpart of [`is_canonical_bytes`], checked by the
    /// property tests.
    #[cfg(test)]
    pub fn is_canonical(&self) -> bool {
        if contains_marker_line(&self.preamble) {
            return false;
        }
        if !self.sections.is_empty() && !ends_at_line_boundary(&self.preamble) {
            return false;
        }

        let last = self.sections.len().saturating_sub(1);
        self.sections.iter().enumerate().all(|(index, section)| {
            !section.name.contains(&b'\n')
                && !contains_marker_line(&section.body)
                && (index == last || ends_at_line_boundary(&section.body))
        })
    }
}

/// Parses and re-formats `raw` in one step, the operation the HTTP endpoint
/// and the offline commands all perform.
pub fn roundtrip(raw: &[u8]) -> Vec<u8> {
    format(&parse(raw))
}

/// Returns `true` when `raw` is already in canonical textual form, i.e. a
/// round trip reproduces it byte for byte. Backs `fmt --check`.
pub fn is_canonical_bytes(raw: &[u8]) -> bool {
    roundtrip(raw) == raw
}

#[cfg(test)]
fn ends_at_line_boundary(text: &[u8]) -> bool {
    text.is_empty() || text.ends_with(b"\n")
}

#[cfg(test)]
fn contains_marker_line(text: &[u8]) -> bool {
    text.split_inclusive(|&byte| byte == b'\n')
        .any(|line| parse::marker_name(line).is_some())
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("name", &self.name_lossy())
            .field("body", &self.body_lossy())
            .finish()
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("preamble", &self.preamble_lossy())
            .field("sections", &self.sections)
            .finish()
    }
}
