//! Offset ↔ line/character mapping for one source text.

use crate::{Position, Span};

/// Maps byte offsets to zero-based line/character positions and back.
///
/// Line starts are computed once from the text; lookups are binary
/// searches over the sorted start offsets. Columns are byte offsets
/// within the line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineMap {
    line_starts: Vec<u32>,
    text_len: u32,
}

impl LineMap {
    /// Compute the line map for a text.
    ///
    /// Recognized line terminators: `\n`, `\r`, and `\r\n` (as one).
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_starts.push((i + 1) as u32);
                    i += 1;
                }
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 2;
                    } else {
                        i += 1;
                    }
                    line_starts.push(i as u32);
                }
                _ => i += 1,
            }
        }
        LineMap {
            line_starts,
            text_len: text.len() as u32,
        }
    }

    /// Number of lines (at least 1, even for empty text).
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// The line containing a byte offset.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(insert) => (insert - 1) as u32,
        }
    }

    /// The position of a byte offset.
    pub fn position_of(&self, offset: u32) -> Position {
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        let line_start = self.line_starts[line as usize];
        Position::new(line, offset - line_start)
    }

    /// The byte offset of a position, clamping past-the-end values.
    pub fn offset_of(&self, position: Position) -> u32 {
        let line = (position.line as usize).min(self.line_starts.len() - 1);
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text_len);
        (line_start + position.character).min(line_end)
    }

    /// The position pair covering a span.
    pub fn range_of(&self, span: Span) -> crate::Range {
        crate::Range::new(self.position_of(span.start), self.position_of(span.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn empty_text() {
        let map = LineMap::new("");
        assert_eq!(map.line_count(), 1);
        assert_eq!(map.position_of(0), Position::new(0, 0));
    }

    #[test]
    fn mixed_terminators() {
        let map = LineMap::new("a\nbb\r\nccc\rd");
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.position_of(0), Position::new(0, 0));
        assert_eq!(map.position_of(2), Position::new(1, 0));
        assert_eq!(map.position_of(3), Position::new(1, 1));
        assert_eq!(map.position_of(6), Position::new(2, 0));
        assert_eq!(map.position_of(10), Position::new(3, 0));
    }

    #[test]
    fn offset_of_clamps_past_line_end() {
        let map = LineMap::new("ab\ncd\n");
        assert_eq!(map.offset_of(Position::new(0, 99)), 3);
        assert_eq!(map.offset_of(Position::new(99, 0)), 6);
    }

    #[test]
    fn line_of_at_line_start() {
        let map = LineMap::new("ab\ncd");
        assert_eq!(map.line_of(3), 1);
        assert_eq!(map.line_of(2), 0);
    }

    proptest! {
        // position_of/offset_of round-trip for every offset that is not
        // inside a line terminator.
        #[test]
        fn roundtrip(text in "[a-z\\n]{0,64}", offset in 0u32..64) {
            let map = LineMap::new(&text);
            let offset = offset.min(text.len() as u32);
            let pos = map.position_of(offset);
            prop_assert_eq!(map.offset_of(pos), offset);
        }
    }
}
