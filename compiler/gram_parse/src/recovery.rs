//! Token sets for error recovery.
//!
//! A [`TokenSet`] is a 128-bit mask over [`SyntaxKind`] discriminants,
//! cheap to build in const context and to test at recovery points.

use gram_syntax::SyntaxKind;

/// Const-friendly set of token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSet(u128);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    pub const fn single(kind: SyntaxKind) -> TokenSet {
        TokenSet(1u128 << kind.discriminant_index())
    }

    pub const fn with(self, kind: SyntaxKind) -> TokenSet {
        TokenSet(self.0 | 1u128 << kind.discriminant_index())
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub const fn contains(self, kind: SyntaxKind) -> bool {
        self.0 & 1u128 << kind.discriminant_index() != 0
    }
}

/// Tokens that close some enclosing construct. Skipping past one of
/// these during recovery would swallow a bracket the caller needs.
pub(crate) const CLOSING_TOKENS: TokenSet = TokenSet::single(SyntaxKind::CloseBracketToken)
    .with(SyntaxKind::CloseBraceToken)
    .with(SyntaxKind::CloseParenToken)
    .with(SyntaxKind::EndOfFileToken);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let set = TokenSet::single(SyntaxKind::CommaToken).with(SyntaxKind::CloseBracketToken);
        assert!(set.contains(SyntaxKind::CommaToken));
        assert!(set.contains(SyntaxKind::CloseBracketToken));
        assert!(!set.contains(SyntaxKind::OpenBracketToken));
    }

    #[test]
    fn union_merges() {
        let a = TokenSet::single(SyntaxKind::AtToken);
        let b = TokenSet::single(SyntaxKind::HashToken);
        let both = a.union(b);
        assert!(both.contains(SyntaxKind::AtToken));
        assert!(both.contains(SyntaxKind::HashToken));
        assert_eq!(TokenSet::EMPTY.union(a), a);
    }
}
