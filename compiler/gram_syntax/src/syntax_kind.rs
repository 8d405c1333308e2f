//! Syntax kinds for tokens and nodes.
//!
//! One flat enum covers both so a token-level traversal and a node-level
//! traversal can report through the same type. All token kinds precede
//! node kinds so token bitsets fit in a `u128`.

use std::fmt;

/// The kind tag for every token and node shape in the grammar language.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(u8)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,

    // Punctuation
    AtToken,                     // @
    OpenBraceToken,              // {
    CloseBraceToken,             // }
    OpenBracketToken,            // [
    OpenBracketGreaterThanToken, // [>
    CloseBracketToken,           // ]
    OpenParenToken,              // (
    CloseParenToken,             // )
    CommaToken,                  // ,
    PlusToken,                   // +
    TildeToken,                  // ~
    QuestionToken,               // ?
    ColonToken,                  // :
    ColonColonToken,             // ::
    ColonColonColonToken,        // :::
    EqualsToken,                 // =
    EqualsEqualsToken,           // ==
    ExclamationEqualsToken,      // !=
    LessThanExclamationToken,    // <!
    LessThanMinusToken,          // <-
    ElementOfToken,              // ∈
    NotAnElementOfToken,         // ∉
    GreaterThanToken,            // >
    HashToken,                   // #link-id

    // Keywords
    ButKeyword,
    DefaultKeyword,
    DefineKeyword,
    EmptyKeyword,
    FalseKeyword,
    GoalKeyword,
    HereKeyword,
    ImportKeyword,
    LexicalKeyword,
    LineKeyword,
    LookaheadKeyword,
    NoKeyword,
    NotKeyword,
    OfKeyword,
    OneKeyword,
    OrKeyword,
    ThroughKeyword,
    TrueKeyword,

    // Literal tokens
    Identifier,
    StringLiteral,
    NumberLiteral,
    TerminalLiteral,
    UnicodeCharacterLiteral,
    ProseFull,
    ProseHead,
    ProseMiddle,
    ProseTail,

    // Nodes
    SourceFile,
    Production,
    ParameterList,
    Parameter,
    ArgumentList,
    Argument,
    Constraints,
    Terminal,
    Nonterminal,
    UnicodeCharacterRange,
    ButNotSymbol,
    OneOfSymbol,
    Prose,
    PlaceholderSymbol,
    InvalidSymbol,
    EmptyAssertion,
    LookaheadAssertion,
    NoSymbolHereAssertion,
    LexicalGoalAssertion,
    InvalidAssertion,
    SymbolSpan,
    SymbolSet,
    RightHandSide,
    RightHandSideList,
    OneOfList,
    LinkReference,
    Import,
    Define,
    Line,
}

impl SyntaxKind {
    /// Index usable in token bitsets. Token kinds all fit under 128.
    #[inline]
    pub const fn discriminant_index(self) -> usize {
        self as u8 as usize
    }

    /// True for anything the scanner can return.
    pub const fn is_token(self) -> bool {
        (self as u8) < (SyntaxKind::SourceFile as u8)
    }

    pub const fn is_node(self) -> bool {
        !self.is_token()
    }

    pub const fn is_keyword(self) -> bool {
        let d = self as u8;
        d >= SyntaxKind::ButKeyword as u8 && d <= SyntaxKind::TrueKeyword as u8
    }

    pub const fn is_punctuation(self) -> bool {
        let d = self as u8;
        d >= SyntaxKind::AtToken as u8 && d <= SyntaxKind::HashToken as u8
    }

    pub const fn is_prose_fragment(self) -> bool {
        matches!(
            self,
            SyntaxKind::ProseFull
                | SyntaxKind::ProseHead
                | SyntaxKind::ProseMiddle
                | SyntaxKind::ProseTail
        )
    }

    pub const fn is_assertion(self) -> bool {
        matches!(
            self,
            SyntaxKind::EmptyAssertion
                | SyntaxKind::LookaheadAssertion
                | SyntaxKind::NoSymbolHereAssertion
                | SyntaxKind::LexicalGoalAssertion
                | SyntaxKind::InvalidAssertion
        )
    }

    /// The keyword kind for an identifier-shaped word, if it is one.
    pub fn keyword_from_str(text: &str) -> Option<SyntaxKind> {
        Some(match text {
            "but" => SyntaxKind::ButKeyword,
            "default" => SyntaxKind::DefaultKeyword,
            "define" => SyntaxKind::DefineKeyword,
            "empty" => SyntaxKind::EmptyKeyword,
            "false" => SyntaxKind::FalseKeyword,
            "goal" => SyntaxKind::GoalKeyword,
            "here" => SyntaxKind::HereKeyword,
            "import" => SyntaxKind::ImportKeyword,
            "lexical" => SyntaxKind::LexicalKeyword,
            "line" => SyntaxKind::LineKeyword,
            "lookahead" => SyntaxKind::LookaheadKeyword,
            "no" => SyntaxKind::NoKeyword,
            "not" => SyntaxKind::NotKeyword,
            "of" => SyntaxKind::OfKeyword,
            "one" => SyntaxKind::OneKeyword,
            "or" => SyntaxKind::OrKeyword,
            "through" => SyntaxKind::ThroughKeyword,
            "true" => SyntaxKind::TrueKeyword,
            _ => return None,
        })
    }

    /// The fixed source text of a punctuation or keyword kind, used in
    /// `'{0}' expected` diagnostics.
    pub const fn text(self) -> Option<&'static str> {
        Some(match self {
            SyntaxKind::AtToken => "@",
            SyntaxKind::OpenBraceToken => "{",
            SyntaxKind::CloseBraceToken => "}",
            SyntaxKind::OpenBracketToken => "[",
            SyntaxKind::OpenBracketGreaterThanToken => "[>",
            SyntaxKind::CloseBracketToken => "]",
            SyntaxKind::OpenParenToken => "(",
            SyntaxKind::CloseParenToken => ")",
            SyntaxKind::CommaToken => ",",
            SyntaxKind::PlusToken => "+",
            SyntaxKind::TildeToken => "~",
            SyntaxKind::QuestionToken => "?",
            SyntaxKind::ColonToken => ":",
            SyntaxKind::ColonColonToken => "::",
            SyntaxKind::ColonColonColonToken => ":::",
            SyntaxKind::EqualsToken => "=",
            SyntaxKind::EqualsEqualsToken => "==",
            SyntaxKind::ExclamationEqualsToken => "!=",
            SyntaxKind::LessThanExclamationToken => "<!",
            SyntaxKind::LessThanMinusToken => "<-",
            SyntaxKind::ElementOfToken => "\u{2208}",
            SyntaxKind::NotAnElementOfToken => "\u{2209}",
            SyntaxKind::GreaterThanToken => ">",
            SyntaxKind::HashToken => "#",
            SyntaxKind::ButKeyword => "but",
            SyntaxKind::DefaultKeyword => "default",
            SyntaxKind::DefineKeyword => "define",
            SyntaxKind::EmptyKeyword => "empty",
            SyntaxKind::FalseKeyword => "false",
            SyntaxKind::GoalKeyword => "goal",
            SyntaxKind::HereKeyword => "here",
            SyntaxKind::ImportKeyword => "import",
            SyntaxKind::LexicalKeyword => "lexical",
            SyntaxKind::LineKeyword => "line",
            SyntaxKind::LookaheadKeyword => "lookahead",
            SyntaxKind::NoKeyword => "no",
            SyntaxKind::NotKeyword => "not",
            SyntaxKind::OfKeyword => "of",
            SyntaxKind::OneKeyword => "one",
            SyntaxKind::OrKeyword => "or",
            SyntaxKind::ThroughKeyword => "through",
            SyntaxKind::TrueKeyword => "true",
            _ => return None,
        })
    }

    /// A human-readable name for diagnostics, falling back to the debug name.
    pub fn display_text(self) -> String {
        match self.text() {
            Some(text) => text.to_string(),
            None => format!("{self:?}"),
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_kinds_fit_in_a_u128_bitset() {
        assert!(SyntaxKind::ProseTail.discriminant_index() < 128);
    }

    #[test]
    fn classification() {
        assert!(SyntaxKind::ColonColonToken.is_token());
        assert!(SyntaxKind::ColonColonToken.is_punctuation());
        assert!(SyntaxKind::OneKeyword.is_keyword());
        assert!(SyntaxKind::Production.is_node());
        assert!(!SyntaxKind::Production.is_token());
        assert!(SyntaxKind::ProseHead.is_prose_fragment());
    }

    #[test]
    fn keyword_lookup() {
        assert_eq!(
            SyntaxKind::keyword_from_str("lookahead"),
            Some(SyntaxKind::LookaheadKeyword)
        );
        assert_eq!(SyntaxKind::keyword_from_str("Lookahead"), None);
        assert_eq!(SyntaxKind::keyword_from_str("foo"), None);
    }

    #[test]
    fn fixed_text() {
        assert_eq!(SyntaxKind::ColonColonColonToken.text(), Some(":::"));
        assert_eq!(SyntaxKind::Identifier.text(), None);
        assert_eq!(SyntaxKind::OneKeyword.to_string(), "one");
    }
}
