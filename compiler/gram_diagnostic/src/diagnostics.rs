//! The diagnostics sink.
//!
//! [`Diagnostics`] accumulates reported occurrences in order. File
//! association uses an append-only marker list ("entries from this index
//! on belong to file X") instead of storing a file per entry. Output is
//! stably sorted (file, position, length, severity, code, message) with
//! adjacent duplicates removed, and rendered as
//! `path(line,col): severity GM<code>: <message>`.

use std::fmt::Write as _;

use crate::catalog::{catalog, MessageCatalog, Severity};
use crate::{LineMap, LineOffsetMap, Position, Span};

/// Diagnostic codes used across the front end.
///
/// 1xxx: scan/parse. 2xxx: semantic.
pub mod codes {
    pub const INVALID_CHARACTER: u32 = 1000;
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1001;
    pub const UNTERMINATED_TERMINAL_LITERAL: u32 = 1002;
    pub const UNTERMINATED_UNICODE_LITERAL: u32 = 1003;
    pub const UNTERMINATED_COMMENT: u32 = 1004;
    pub const UNTERMINATED_PROSE: u32 = 1005;
    pub const INVALID_CHARACTER_ENTITY: u32 = 1006;
    pub const DIGIT_EXPECTED: u32 = 1007;
    pub const UNEXPECTED_TOKEN: u32 = 1008;
    pub const TOKEN_EXPECTED: u32 = 1009;
    pub const IDENTIFIER_EXPECTED: u32 = 1010;
    pub const STRING_LITERAL_EXPECTED: u32 = 1011;
    pub const NUMBER_LITERAL_EXPECTED: u32 = 1012;
    pub const TERMINAL_LITERAL_EXPECTED: u32 = 1013;
    pub const PRODUCTION_EXPECTED: u32 = 1014;
    pub const INVALID_SYMBOL: u32 = 1015;
    pub const INVALID_ASSERTION: u32 = 1016;
    pub const UNTERMINATED_HTML_TRIVIA: u32 = 1017;

    pub const CANNOT_FIND_NAME: u32 = 2000;
    pub const DUPLICATE_IDENTIFIER: u32 = 2001;
    pub const DUPLICATE_TERMINAL: u32 = 2002;
    pub const MISSING_PARAMETER: u32 = 2003;
    pub const UNKNOWN_PARAMETER: u32 = 2004;
    pub const DUPLICATE_ARGUMENT: u32 = 2005;
    pub const MISSING_ARGUMENT: u32 = 2006;
    pub const CANNOT_FIND_PARAMETER: u32 = 2007;
    pub const UNUSED_PARAMETER: u32 = 2008;
    pub const DEFINE_KEY_EXPECTED: u32 = 2020;
    pub const INVALID_DEFINE_KEY: u32 = 2021;
    pub const INVALID_DEFINE_VALUE: u32 = 2022;
    pub const LINE_NUMBER_EXPECTED: u32 = 2030;
}

/// One reported occurrence.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub code: u32,
    /// Anchoring range, if any. Node-anchored reports pass the node span.
    pub span: Option<Span>,
    /// Format arguments for the catalog template.
    pub args: Vec<String>,
}

/// Marker: entries from `first_index` onward belong to `filename`.
#[derive(Clone, Debug)]
struct FileMarker {
    first_index: usize,
    filename: String,
    line_map: LineMap,
}

/// A sorted, deduplicated, position-resolved diagnostic ready to render.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FormattedDiagnostic {
    pub filename: String,
    pub position: Position,
    pub length: u32,
    pub severity: Severity,
    pub code: u32,
    pub message: String,
}

impl FormattedDiagnostic {
    /// Render as `path(line,col): severity GM<code>: <message>`.
    pub fn to_line(&self) -> String {
        let mut out = String::new();
        if !self.filename.is_empty() {
            let _ = write!(out, "{}({}): ", self.filename, self.position);
        }
        let _ = write!(out, "{} GM{}: {}", self.severity, self.code, self.message);
        out
    }
}

/// Append-only diagnostics collection.
#[derive(Debug)]
pub struct Diagnostics {
    catalog: &'static MessageCatalog,
    entries: Vec<Diagnostic>,
    markers: Vec<FileMarker>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics {
            catalog: catalog(),
            entries: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Associate subsequent reports with `filename`.
    ///
    /// Appends a marker only when the file actually changes.
    pub fn set_source_file(&mut self, filename: &str, line_map: &LineMap) {
        if self
            .markers
            .last()
            .is_some_and(|m| m.filename == filename)
        {
            return;
        }
        self.markers.push(FileMarker {
            first_index: self.entries.len(),
            filename: filename.to_string(),
            line_map: line_map.clone(),
        });
    }

    /// Report an occurrence with no anchoring range.
    pub fn report(&mut self, code: u32, args: Vec<String>) {
        self.entries.push(Diagnostic {
            code,
            span: None,
            args,
        });
    }

    /// Report an occurrence anchored at a span of the current file.
    pub fn report_at(&mut self, span: Span, code: u32, args: Vec<String>) {
        self.entries.push(Diagnostic {
            code,
            span: Some(span),
            args,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Watermark for [`rollback`](Self::rollback).
    pub fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Discard every entry reported since `mark` was taken.
    ///
    /// Used by speculative scanning: reports made during a rolled-back
    /// speculation must not surface.
    pub fn rollback(&mut self, mark: usize) {
        self.entries.truncate(mark);
        self.markers.retain(|m| m.first_index <= mark);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| self.catalog.severity_of(d.code) == Severity::Error)
            .count()
    }

    /// Append all entries (and markers) of `other` after this collection.
    pub fn merge(&mut self, other: Diagnostics) {
        let base = self.entries.len();
        for marker in other.markers {
            self.markers.push(FileMarker {
                first_index: marker.first_index + base,
                filename: marker.filename,
                line_map: marker.line_map,
            });
        }
        self.entries.extend(other.entries);
    }

    fn marker_of(&self, index: usize) -> Option<&FileMarker> {
        // Last marker whose first_index is at or before the entry.
        let at = self.markers.partition_point(|m| m.first_index <= index);
        at.checked_sub(1).map(|at| &self.markers[at])
    }

    /// Resolve, remap (when `line_offsets` is given), sort, and dedupe.
    pub fn collect(&self, line_offsets: Option<&LineOffsetMap>) -> Vec<FormattedDiagnostic> {
        let mut out: Vec<FormattedDiagnostic> = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let marker = self.marker_of(index);
            let raw_filename = marker.map_or("", |m| m.filename.as_str());
            let raw_position = match (marker, entry.span) {
                (Some(marker), Some(span)) => marker.line_map.position_of(span.start),
                _ => Position::default(),
            };
            let (filename, position) = match line_offsets {
                Some(map) => (
                    map.effective_filename_at(raw_filename, raw_position)
                        .to_string(),
                    map.effective_position(raw_filename, raw_position),
                ),
                None => (raw_filename.to_string(), raw_position),
            };
            out.push(FormattedDiagnostic {
                filename,
                position,
                length: entry.span.map_or(0, |s| s.len()),
                severity: self.catalog.severity_of(entry.code),
                code: entry.code,
                message: self.catalog.format_message(entry.code, &entry.args),
            });
        }
        out.sort_by(|a, b| {
            a.filename
                .cmp(&b.filename)
                .then(a.position.cmp(&b.position))
                .then(a.length.cmp(&b.length))
                .then(a.severity.cmp(&b.severity))
                .then(a.code.cmp(&b.code))
                .then(a.message.cmp(&b.message))
        });
        out.dedup();
        out
    }

    /// Render every diagnostic on its own line, sorted and deduplicated.
    pub fn format(&self, line_offsets: Option<&LineOffsetMap>) -> String {
        let mut out = String::new();
        for diagnostic in self.collect(line_offsets) {
            out.push_str(&diagnostic.to_line());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(diags: &mut Diagnostics, name: &str, text: &str) {
        let map = LineMap::new(text);
        diags.set_source_file(name, &map);
    }

    #[test]
    fn reports_without_file_render_bare() {
        let mut diags = Diagnostics::new();
        diags.report(codes::DIGIT_EXPECTED, vec![]);
        assert_eq!(diags.format(None), "error GM1007: Digit expected.\n");
    }

    #[test]
    fn file_markers_attribute_entries() {
        let mut diags = Diagnostics::new();
        file(&mut diags, "a.grammar", "one\ntwo\n");
        diags.report_at(Span::new(4, 7), codes::IDENTIFIER_EXPECTED, vec![]);
        file(&mut diags, "b.grammar", "x\n");
        diags.report_at(Span::new(0, 1), codes::DIGIT_EXPECTED, vec![]);

        let collected = diags.collect(None);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].filename, "a.grammar");
        assert_eq!(collected[0].position, Position::new(1, 0));
        assert_eq!(collected[1].filename, "b.grammar");
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let mut diags = Diagnostics::new();
        file(&mut diags, "a.grammar", "abcdef\n");
        diags.report_at(Span::new(3, 5), codes::IDENTIFIER_EXPECTED, vec![]);
        diags.report_at(Span::new(1, 2), codes::IDENTIFIER_EXPECTED, vec![]);
        diags.report_at(Span::new(1, 2), codes::IDENTIFIER_EXPECTED, vec![]);

        let collected = diags.collect(None);
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].position, Position::new(0, 1));
        assert_eq!(collected[1].position, Position::new(0, 3));
    }

    #[test]
    fn line_offsets_remap_rendered_positions() {
        let mut diags = Diagnostics::new();
        file(&mut diags, "a.grammar", "one\ntwo\nthree\n");
        diags.report_at(Span::new(8, 13), codes::PRODUCTION_EXPECTED, vec![]);

        let mut offsets = LineOffsetMap::new();
        offsets.add_line_offset(
            "a.grammar",
            0,
            Some(crate::LineOffset {
                file: Some("spec.html".to_string()),
                line: 100,
            }),
        );
        let collected = diags.collect(Some(&offsets));
        assert_eq!(collected[0].filename, "spec.html");
        assert_eq!(collected[0].position, Position::new(102, 0));
    }

    #[test]
    fn format_line_shape() {
        let mut diags = Diagnostics::new();
        file(&mut diags, "a.grammar", "x\n");
        diags.report_at(
            Span::new(0, 1),
            codes::CANNOT_FIND_NAME,
            vec!["Expression".to_string()],
        );
        assert_eq!(
            diags.format(None),
            "a.grammar(1,1): error GM2000: Cannot find name: 'Expression'.\n"
        );
    }
}
