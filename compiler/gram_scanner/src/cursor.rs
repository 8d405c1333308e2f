//! Character cursor over the source text.
//!
//! The cursor is [`Copy`], which is what makes scanner speculation cheap:
//! a snapshot is a plain field copy, and restoring is assignment.

/// A position-tracking cursor over `&str`.
///
/// Grammar files are UTF-8; the cursor reads whole characters and keeps
/// its position in bytes so spans index directly into the text.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Cursor { text, pos: 0 }
    }

    /// A cursor positioned at `pos`, which must lie on a character boundary.
    pub fn at(text: &'a str, pos: u32) -> Self {
        debug_assert!(text.is_char_boundary(pos as usize));
        Cursor { text, pos }
    }

    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos as usize >= self.text.len()
    }

    /// The character at the current position, `None` at EOF.
    #[inline]
    pub fn current(&self) -> Option<char> {
        self.text[self.pos as usize..].chars().next()
    }

    /// The character one past the current one.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let mut chars = self.text[self.pos as usize..].chars();
        chars.next();
        chars.next()
    }

    /// Advance past the current character. No-op at EOF.
    #[inline]
    pub fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8() as u32;
        }
    }

    /// Advance while `predicate` holds for the current character.
    pub fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.current() {
            if !predicate(c) {
                break;
            }
            self.pos += c.len_utf8() as u32;
        }
    }

    /// Advance by `n` bytes, which must land on a character boundary.
    #[inline]
    pub fn advance_bytes(&mut self, n: u32) {
        self.pos = (self.pos + n).min(self.text.len() as u32);
        debug_assert!(self.text.is_char_boundary(self.pos as usize));
    }

    /// Consume `expected` if it is the current character.
    #[inline]
    pub fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.pos += expected.len_utf8() as u32;
            true
        } else {
            false
        }
    }

    /// Slice of the text between two byte positions.
    #[inline]
    pub fn slice(&self, start: u32, end: u32) -> &'a str {
        &self.text[start as usize..end as usize]
    }

    /// True when the current character starts a line terminator.
    #[inline]
    pub fn at_line_terminator(&self) -> bool {
        matches!(self.current(), Some('\n' | '\r'))
    }

    /// Consume one line terminator (`\n`, `\r`, or `\r\n`).
    pub fn eat_line_terminator(&mut self) -> bool {
        match self.current() {
            Some('\n') => {
                self.advance();
                true
            }
            Some('\r') => {
                self.advance();
                self.eat('\n');
                true
            }
            _ => false,
        }
    }
}
