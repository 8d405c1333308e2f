//! `@line` remapping to a virtual file/line for diagnostics.
//!
//! An `@line` pragma redirects everything from its source line onward to a
//! different (file, line) origin, until superseded by another pragma or an
//! `@line default`. Built on [`RegionMap`].

use crate::{Position, Range, Region, RegionMap};

/// The target of one `@line` pragma.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineOffset {
    /// Remapped filename; `None` keeps the raw filename.
    pub file: Option<String>,
    /// The line (zero-based) the pragma's own line maps to.
    pub line: u32,
}

/// Remaps raw positions in scanned files to their effective origin.
///
/// A region value of `None` is an `@line default` reset: positions from
/// that line forward report their raw location again.
#[derive(Clone, Debug, Default)]
pub struct LineOffsetMap {
    regions: RegionMap<Option<LineOffset>>,
}

impl LineOffsetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an `@line` pragma: lines of `file` from `line` onward map to
    /// `offset` (or back to themselves for `None`).
    pub fn add_line_offset(&mut self, file: &str, line: u32, offset: Option<LineOffset>) {
        self.regions.add(file, line, offset);
    }

    /// Drop all pragmas recorded for `file` (used when re-checking).
    pub fn clear_file(&mut self, file: &str) {
        self.regions.clear_file(file);
    }

    fn region_at(&self, file: &str, line: u32) -> Option<&Region<Option<LineOffset>>> {
        self.regions.find(file, line)
    }

    /// The effective filename for a raw position in `file`.
    pub fn effective_filename_at<'a>(&'a self, file: &'a str, position: Position) -> &'a str {
        match self.region_at(file, position.line) {
            Some(Region {
                value: Some(offset),
                ..
            }) => offset.file.as_deref().unwrap_or(file),
            _ => file,
        }
    }

    /// The effective position for a raw position in `file`.
    pub fn effective_position(&self, file: &str, position: Position) -> Position {
        match self.region_at(file, position.line) {
            Some(Region {
                line,
                value: Some(offset),
            }) => Position::new(offset.line + (position.line - line), position.character),
            _ => position,
        }
    }

    /// The effective range for a raw range in `file`.
    pub fn effective_range(&self, file: &str, range: Range) -> Range {
        Range::new(
            self.effective_position(file, range.start),
            self.effective_position(file, range.end),
        )
    }

    /// Inverse lookup: the raw position in `file` for an effective
    /// (remapped) position, if some pragma in `file` produces it.
    pub fn raw_position_from_effective(
        &self,
        file: &str,
        effective_file: &str,
        effective: Position,
    ) -> Option<Position> {
        let mut best: Option<Position> = None;
        for region in self.regions.regions(file) {
            let Some(offset) = &region.value else {
                continue;
            };
            let target = offset.file.as_deref().unwrap_or(file);
            if target != effective_file || effective.line < offset.line {
                continue;
            }
            let raw_line = region.line + (effective.line - offset.line);
            // Later pragmas win, mirroring forward resolution.
            if self.region_at(file, raw_line).map(|r| r.line) == Some(region.line) {
                best = Some(Position::new(raw_line, effective.character));
            }
        }
        best
    }
}
