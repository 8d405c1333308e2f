//! Tokens and token flags.

use gram_diagnostic::Span;

use crate::SyntaxKind;

bitflags::bitflags! {
    /// Flags describing what the scanner crossed before a token.
    ///
    /// The indentation flags are how the parser delimits indented lists
    /// (right-hand-side alternatives) without explicit braces.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TokenFlags: u8 {
        /// At least one line terminator precedes the token.
        const PRECEDING_LINE_TERMINATOR = 1 << 0;
        /// A blank line precedes the token.
        const PRECEDING_BLANK_LINE = 1 << 1;
        /// The token opens a new indented block.
        const PRECEDING_INDENT = 1 << 2;
        /// The token closes the current indented block.
        const PRECEDING_DEDENT = 1 << 3;
        /// The token continues the previous logical line despite a
        /// physical line break (indent deeper than the open block).
        const LINE_CONTINUATION = 1 << 4;
    }
}

/// A scanned token: kind plus `[pos, end)` range.
///
/// Literal payloads (identifier text, cooked string values) live on the
/// scanner, not the token.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub const fn new(kind: SyntaxKind, span: Span) -> Self {
        Token { kind, span }
    }

    #[inline]
    pub const fn pos(&self) -> u32 {
        self.span.start
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_compose() {
        let flags = TokenFlags::PRECEDING_LINE_TERMINATOR | TokenFlags::PRECEDING_INDENT;
        assert!(flags.contains(TokenFlags::PRECEDING_INDENT));
        assert!(!flags.contains(TokenFlags::PRECEDING_DEDENT));
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(SyntaxKind::Identifier, Span::new(3, 8));
        assert_eq!(token.pos(), 3);
        assert_eq!(token.end(), 8);
    }
}
