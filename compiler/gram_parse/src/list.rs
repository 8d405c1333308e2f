//! The generic list engine.
//!
//! Every repeated construct in the grammar — source elements, parameter
//! and argument lists, indented right-hand-side lists, `one of` rows,
//! symbol sets — parses through [`Parser::parse_list`], driven by a
//! [`ListContext`] that fixes the element parser, terminators, separator
//! policy, and recovery set for that position. Recovery always advances
//! the scanner; a list iteration that fails to make progress is a
//! parser bug and panics.

use gram_diagnostic::Canceled;
use gram_syntax::{NodeList, SyntaxKind, TokenFlags};
use smallvec::SmallVec;
use tracing::trace;

use crate::Parser;

/// The kind of list being parsed, selecting all position-specific
/// behavior in the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListContext {
    /// Top-level meta directives and productions.
    SourceElements,
    /// `[In, Yield]` after a production name.
    Parameters,
    /// `[?In, +Yield]` after a nonterminal reference.
    Arguments,
    /// `[+In]` constraints opening a right-hand side.
    Constraints,
    /// One right-hand side per line under an indented production.
    RightHandSides,
    /// `one of` terminals on the same line as the production.
    OneOfList,
    /// `one of` terminal rows on indented lines.
    OneOfListIndented,
    /// `one of \`a\` or \`b\`` in symbol position.
    OneOfSymbolList,
    /// `{ \`a\`, \`b\` }` lookahead operand.
    SymbolSet,
    /// Symbols of `[no LineTerminator here]`.
    NoSymbolHere,
}

enum AfterElement {
    Continue,
    Stop,
}

impl Parser<'_> {
    pub(crate) fn parse_list(&mut self, context: ListContext) -> Result<NodeList, Canceled> {
        let mut elements: SmallVec<[gram_syntax::NodeId; 8]> = SmallVec::new();
        loop {
            self.cancel.check()?;
            if self.is_list_terminator(context) {
                break;
            }
            let before = self.token_start();
            if self.is_list_element_start(context) {
                if let Some(element) = self.parse_list_element(context)? {
                    elements.push(element);
                    match self.after_element(context)? {
                        AfterElement::Continue => {}
                        AfterElement::Stop => break,
                    }
                }
            } else {
                trace!(context = ?context, token = ?self.token(), "unexpected token in list");
                let text = self.unexpected_token_text();
                self.report(gram_diagnostic::codes::UNEXPECTED_TOKEN, vec![text]);
            }
            if !self.is_list_terminator(context) && self.token_start() == before {
                self.recover_in_list(context)?;
            }
            assert!(
                self.token_start() > before
                    || self.is_list_terminator(context)
                    || self.token() == SyntaxKind::EndOfFileToken,
                "list recovery failed to advance the scanner"
            );
        }
        Ok(self.arena().add_list(&elements))
    }

    fn unexpected_token_text(&self) -> String {
        let token = self.token();
        match token.text() {
            Some(text) => text.to_string(),
            None => self.token_text().to_string(),
        }
    }

    fn is_list_terminator(&self, context: ListContext) -> bool {
        if self.token() == SyntaxKind::EndOfFileToken {
            return true;
        }
        let token = self.token();
        let flags = self.token_flags();
        // A closing token terminates every bracketed context, even the
        // wrong one; the surrounding `expect` reports the mismatch.
        let closing = crate::recovery::CLOSING_TOKENS.contains(token);
        match context {
            ListContext::SourceElements => false,
            // A colon after an unclosed parameter list belongs to the
            // production, not the list.
            ListContext::Parameters => {
                closing
                    || self.starts_new_line()
                    || matches!(
                        token,
                        SyntaxKind::ColonToken
                            | SyntaxKind::ColonColonToken
                            | SyntaxKind::ColonColonColonToken
                    )
            }
            ListContext::Arguments | ListContext::Constraints | ListContext::SymbolSet => {
                closing || self.starts_new_line()
            }
            ListContext::RightHandSides | ListContext::OneOfListIndented => {
                flags.intersects(TokenFlags::PRECEDING_DEDENT | TokenFlags::PRECEDING_BLANK_LINE)
            }
            ListContext::OneOfList => self.starts_new_line(),
            ListContext::OneOfSymbolList => closing || self.starts_new_line(),
            ListContext::NoSymbolHere => {
                token == SyntaxKind::HereKeyword || closing || self.starts_new_line()
            }
        }
    }

    fn is_list_element_start(&self, context: ListContext) -> bool {
        let token = self.token();
        match context {
            ListContext::SourceElements => {
                token == SyntaxKind::AtToken || self.identifier_like()
            }
            ListContext::Parameters => self.identifier_like(),
            ListContext::Arguments | ListContext::Constraints => {
                matches!(
                    token,
                    SyntaxKind::QuestionToken | SyntaxKind::PlusToken | SyntaxKind::TildeToken
                ) || self.identifier_like()
            }
            ListContext::RightHandSides => {
                token == SyntaxKind::OpenBracketToken || self.is_start_of_symbol()
            }
            ListContext::OneOfList | ListContext::OneOfListIndented => {
                matches!(
                    token,
                    SyntaxKind::TerminalLiteral | SyntaxKind::UnicodeCharacterLiteral
                )
            }
            ListContext::OneOfSymbolList
            | ListContext::SymbolSet
            | ListContext::NoSymbolHere => self.is_start_of_symbol(),
        }
    }

    fn parse_list_element(
        &mut self,
        context: ListContext,
    ) -> Result<Option<gram_syntax::NodeId>, Canceled> {
        match context {
            ListContext::SourceElements => self.parse_source_element(),
            ListContext::Parameters => self.parse_parameter(),
            ListContext::Arguments | ListContext::Constraints => self.parse_argument(),
            ListContext::RightHandSides => self.parse_right_hand_side().map(Some),
            ListContext::OneOfList | ListContext::OneOfListIndented => {
                self.parse_one_of_terminal()
            }
            ListContext::OneOfSymbolList | ListContext::NoSymbolHere => {
                self.parse_primary_symbol().map(Some)
            }
            ListContext::SymbolSet => self.parse_symbol_span().map(Some),
        }
    }

    fn after_element(&mut self, context: ListContext) -> Result<AfterElement, Canceled> {
        match context {
            ListContext::Parameters
            | ListContext::Arguments
            | ListContext::Constraints
            | ListContext::SymbolSet => {
                if self.eat(SyntaxKind::CommaToken)? || self.is_list_terminator(context) {
                    Ok(AfterElement::Continue)
                } else {
                    // Missing comma: report once and keep collecting, the
                    // writer almost certainly meant another element.
                    self.report_expected(SyntaxKind::CommaToken);
                    Ok(AfterElement::Continue)
                }
            }
            ListContext::OneOfSymbolList => {
                if self.eat(SyntaxKind::OrKeyword)? {
                    Ok(AfterElement::Continue)
                } else {
                    Ok(AfterElement::Stop)
                }
            }
            ListContext::NoSymbolHere => {
                self.eat(SyntaxKind::OrKeyword)?;
                Ok(AfterElement::Continue)
            }
            ListContext::SourceElements
            | ListContext::RightHandSides
            | ListContext::OneOfList
            | ListContext::OneOfListIndented => Ok(AfterElement::Continue),
        }
    }

    /// Skip tokens until the list can resynchronize. Consumes at least
    /// one token unless already at a terminator.
    fn recover_in_list(&mut self, context: ListContext) -> Result<(), Canceled> {
        while self.token() != SyntaxKind::EndOfFileToken && !self.is_list_terminator(context) {
            self.next_token()?;
            if self.starts_new_line() || self.is_list_element_start(context) {
                break;
            }
        }
        Ok(())
    }
}
