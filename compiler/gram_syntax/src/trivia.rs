//! Trivia: comments and HTML markup tokens outside the abstract syntax.
//!
//! Trivia never overlaps tokens. After parsing, each piece is attached to
//! exactly one of: a node's leading set, a node's trailing set, or the
//! tree's detached set (see `TriviaTable` on the source file).

use gram_diagnostic::Span;

use crate::Name;

/// Index into a source file's trivia pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct TriviaId(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TriviaKind {
    SingleLineComment,
    MultiLineComment,
    /// `<tag>` — marks the start of a revision range (e.g. `<ins>`).
    HtmlOpenTag,
    /// `</tag>` — marks the end of a revision range.
    HtmlCloseTag,
}

impl TriviaKind {
    pub const fn is_html(self) -> bool {
        matches!(self, TriviaKind::HtmlOpenTag | TriviaKind::HtmlCloseTag)
    }
}

/// One piece of trivia.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub span: Span,
    /// Tag name for HTML trivia (`ins`, `del`, ...), `None` for comments.
    pub tag: Option<Name>,
}

impl Trivia {
    pub const fn new(kind: TriviaKind, span: Span, tag: Option<Name>) -> Self {
        Trivia { kind, span, tag }
    }
}
