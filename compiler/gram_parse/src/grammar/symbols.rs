//! Symbol expressions: terminals, nonterminals, ranges, prose,
//! assertions, symbol sets, and the `but not` combinator.

use gram_diagnostic::{codes, Canceled};
use gram_syntax::{NodeId, NodeKind, SyntaxKind};

use crate::{ListContext, Parser};

impl Parser<'_> {
    /// Can the current token begin a symbol? `but`, `or`, and `through`
    /// are combinator words, not symbol names.
    pub(crate) fn is_start_of_symbol(&self) -> bool {
        match self.token() {
            SyntaxKind::TerminalLiteral
            | SyntaxKind::UnicodeCharacterLiteral
            | SyntaxKind::AtToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::OpenBracketGreaterThanToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken => true,
            SyntaxKind::ButKeyword | SyntaxKind::OrKeyword | SyntaxKind::ThroughKeyword => false,
            _ => self.identifier_like(),
        }
    }

    /// A run of symbols up to the end of the logical line, `#link`, or
    /// the first non-symbol token. A single symbol stands alone without
    /// a wrapping span node.
    pub(crate) fn parse_symbol_span(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let mut symbols = Vec::new();
        if self.is_start_of_symbol() {
            symbols.push(self.parse_symbol()?);
            while !self.starts_new_line() && self.is_start_of_symbol() {
                self.cancel.check()?;
                symbols.push(self.parse_symbol()?);
            }
        }
        match symbols.as_slice() {
            [single] => Ok(*single),
            _ => {
                let elements = self.arena().add_list(&symbols);
                Ok(self.add_node(NodeKind::SymbolSpan { elements }, start))
            }
        }
    }

    /// A unary symbol with an optional `but not` exclusion.
    pub(crate) fn parse_symbol(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let left = self.parse_unary_symbol()?;
        if self.token() != SyntaxKind::ButKeyword || self.starts_new_line() {
            return Ok(left);
        }
        self.next_token()?; // but
        self.expect(SyntaxKind::NotKeyword)?;
        let right = if !self.starts_new_line() && self.is_start_of_symbol() {
            Some(self.parse_unary_symbol()?)
        } else {
            self.report(codes::INVALID_SYMBOL, vec![]);
            None
        };
        Ok(self.add_node(
            NodeKind::ButNotSymbol {
                left: Some(left),
                right,
            },
            start,
        ))
    }

    fn parse_unary_symbol(&mut self) -> Result<NodeId, Canceled> {
        if self.at_one_of()? {
            let start = self.token_start();
            self.next_token()?; // one
            self.next_token()?; // of
            let symbols = self.parse_list(ListContext::OneOfSymbolList)?;
            return Ok(self.add_node(NodeKind::OneOfSymbol { symbols }, start));
        }
        self.parse_primary_symbol()
    }

    pub(crate) fn parse_primary_symbol(&mut self) -> Result<NodeId, Canceled> {
        match self.token() {
            SyntaxKind::TerminalLiteral => self.parse_terminal(),
            SyntaxKind::UnicodeCharacterLiteral => self.parse_unicode_symbol(),
            SyntaxKind::AtToken => {
                let start = self.token_start();
                self.next_token()?;
                Ok(self.add_node(NodeKind::PlaceholderSymbol, start))
            }
            SyntaxKind::GreaterThanToken | SyntaxKind::OpenBracketGreaterThanToken => {
                self.parse_prose()
            }
            SyntaxKind::OpenBraceToken => self.parse_symbol_set(),
            SyntaxKind::OpenBracketToken => self.parse_assertion(),
            _ if self.is_start_of_symbol() => self.parse_nonterminal(),
            _ => {
                let start = self.token_start();
                self.report(codes::INVALID_SYMBOL, vec![]);
                Ok(self.add_node(NodeKind::InvalidSymbol, start))
            }
        }
    }

    fn parse_terminal(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let text = self.token_name();
        self.next_token()?;
        let literal = self.add_node(NodeKind::TerminalLiteral { text }, start);
        let question = self.eat(SyntaxKind::QuestionToken)?;
        Ok(self.add_node(NodeKind::Terminal { literal, question }, start))
    }

    /// `<TAB>` alone, or `<A> through <Z>` as a range.
    fn parse_unicode_symbol(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let text = self.token_name();
        self.next_token()?;
        let left = self.add_node(NodeKind::UnicodeCharacterLiteral { text }, start);
        if self.token() != SyntaxKind::ThroughKeyword || self.starts_new_line() {
            return Ok(left);
        }
        self.next_token()?; // through
        let right = if self.token() == SyntaxKind::UnicodeCharacterLiteral
            && !self.starts_new_line()
        {
            let right_start = self.token_start();
            let right_text = self.token_name();
            self.next_token()?;
            self.add_node(
                NodeKind::UnicodeCharacterLiteral { text: right_text },
                right_start,
            )
        } else {
            let at = self.token_start();
            self.report(codes::INVALID_SYMBOL, vec![]);
            self.add_node(NodeKind::InvalidSymbol, at)
        };
        Ok(self.add_node(NodeKind::UnicodeCharacterRange { left, right }, start))
    }

    fn parse_nonterminal(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let name = match self.parse_identifier()? {
            Some(name) => name,
            None => {
                return Ok(self.add_node(NodeKind::InvalidSymbol, start));
            }
        };
        let arguments = if self.at_argument_list()? {
            Some(self.parse_argument_list()?)
        } else {
            None
        };
        let question = self.eat(SyntaxKind::QuestionToken)?;
        Ok(self.add_node(
            NodeKind::Nonterminal {
                name,
                arguments,
                question,
            },
            start,
        ))
    }

    /// Disambiguate `A[?In]` (arguments) from `A [lookahead ...]` (a
    /// following assertion): arguments need an operator, or a plain name
    /// closed off by `,` or `]`.
    fn at_argument_list(&mut self) -> Result<bool, Canceled> {
        if self.token() != SyntaxKind::OpenBracketToken || self.starts_new_line() {
            return Ok(false);
        }
        let found = self.lookahead(|p| {
            p.next_token()?;
            match p.token() {
                SyntaxKind::QuestionToken | SyntaxKind::PlusToken | SyntaxKind::TildeToken => {
                    Ok(Some(()))
                }
                SyntaxKind::LookaheadKeyword
                | SyntaxKind::NoKeyword
                | SyntaxKind::LexicalKeyword
                | SyntaxKind::EmptyKeyword => Ok(None),
                _ if p.identifier_like() => {
                    p.next_token()?;
                    Ok(matches!(
                        p.token(),
                        SyntaxKind::CommaToken | SyntaxKind::CloseBracketToken
                    )
                    .then_some(()))
                }
                _ => Ok(None),
            }
        })?;
        Ok(found.is_some())
    }

    fn parse_argument_list(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // [
        let elements = self.parse_list(ListContext::Arguments)?;
        self.expect(SyntaxKind::CloseBracketToken)?;
        Ok(self.add_node(NodeKind::ArgumentList { elements }, start))
    }

    /// `> prose text` to end of line, or `[> prose text]`. Embedded
    /// `` `terminal` `` and `|Name|` tokens become symbol children
    /// between fragments.
    fn parse_prose(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let bracketed = self.token() == SyntaxKind::OpenBracketGreaterThanToken;
        self.next_token()?; // > or [>
        let mut fragments = Vec::new();
        loop {
            if self.starts_new_line() {
                break;
            }
            match self.token() {
                kind if kind.is_prose_fragment() => {
                    let fragment_start = self.token_start();
                    let text = self.token_name();
                    self.next_token()?;
                    fragments.push(self.add_node(
                        NodeKind::ProseFragment {
                            fragment: kind,
                            text,
                        },
                        fragment_start,
                    ));
                }
                SyntaxKind::TerminalLiteral => fragments.push(self.parse_terminal()?),
                SyntaxKind::Identifier => {
                    let id_start = self.token_start();
                    let name = self.token_name();
                    self.next_token()?;
                    let name = self.add_node(NodeKind::Identifier { name }, id_start);
                    fragments.push(self.add_node(
                        NodeKind::Nonterminal {
                            name,
                            arguments: None,
                            question: false,
                        },
                        id_start,
                    ));
                }
                _ => break,
            }
        }
        if bracketed {
            // Unterminated bracketed prose was already reported by the
            // scanner, so the close bracket is eaten without complaint.
            self.eat(SyntaxKind::CloseBracketToken)?;
        }
        let fragments = self.arena().add_list(&fragments);
        Ok(self.add_node(NodeKind::Prose { fragments }, start))
    }

    fn parse_symbol_set(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // {
        let elements = self.parse_list(ListContext::SymbolSet)?;
        self.expect(SyntaxKind::CloseBraceToken)?;
        Ok(self.add_node(NodeKind::SymbolSet { elements }, start))
    }

    fn parse_assertion(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // [
        let node = match self.token() {
            SyntaxKind::EmptyKeyword => {
                self.next_token()?;
                self.add_node(NodeKind::EmptyAssertion, start)
            }
            SyntaxKind::LookaheadKeyword => self.parse_lookahead_assertion(start)?,
            SyntaxKind::NoKeyword => {
                self.next_token()?;
                let symbols = self.parse_list(ListContext::NoSymbolHere)?;
                self.expect(SyntaxKind::HereKeyword)?;
                self.add_node(NodeKind::NoSymbolHereAssertion { symbols }, start)
            }
            SyntaxKind::LexicalKeyword => {
                self.next_token()?;
                self.expect(SyntaxKind::GoalKeyword)?;
                let symbol = if self.identifier_like() && !self.starts_new_line() {
                    let symbol_start = self.token_start();
                    match self.parse_identifier()? {
                        Some(name) => Some(self.add_node(
                            NodeKind::Nonterminal {
                                name,
                                arguments: None,
                                question: false,
                            },
                            symbol_start,
                        )),
                        None => None,
                    }
                } else {
                    self.report(codes::IDENTIFIER_EXPECTED, vec![]);
                    None
                };
                self.add_node(NodeKind::LexicalGoalAssertion { symbol }, start)
            }
            _ => {
                self.report(codes::INVALID_ASSERTION, vec![]);
                // Skip to the close bracket or the end of the line so one
                // bad assertion costs one diagnostic.
                while !matches!(
                    self.token(),
                    SyntaxKind::CloseBracketToken | SyntaxKind::EndOfFileToken
                ) && !self.starts_new_line()
                {
                    self.next_token()?;
                }
                self.add_node(NodeKind::InvalidAssertion, start)
            }
        };
        self.expect(SyntaxKind::CloseBracketToken)?;
        Ok(node)
    }

    fn parse_lookahead_assertion(&mut self, start: u32) -> Result<NodeId, Canceled> {
        self.next_token()?; // lookahead
        let operator = match self.token() {
            kind @ (SyntaxKind::EqualsToken
            | SyntaxKind::EqualsEqualsToken
            | SyntaxKind::ExclamationEqualsToken
            | SyntaxKind::LessThanMinusToken
            | SyntaxKind::LessThanExclamationToken
            | SyntaxKind::ElementOfToken
            | SyntaxKind::NotAnElementOfToken) => {
                self.next_token()?;
                kind
            }
            _ => {
                self.report_expected(SyntaxKind::EqualsEqualsToken);
                SyntaxKind::EqualsEqualsToken
            }
        };
        let operand = if self.token() == SyntaxKind::OpenBraceToken {
            Some(self.parse_symbol_set()?)
        } else if !self.starts_new_line() && self.is_start_of_symbol() {
            Some(self.parse_unary_symbol()?)
        } else {
            self.report(codes::INVALID_SYMBOL, vec![]);
            None
        };
        Ok(self.add_node(NodeKind::LookaheadAssertion { operator, operand }, start))
    }
}
