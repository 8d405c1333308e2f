//! Productions, their parameter lists, and right-hand sides.

use gram_diagnostic::{codes, Canceled};
use gram_syntax::{Name, NodeId, NodeKind, SyntaxKind, TokenFlags};

use crate::{ListContext, Parser};

impl Parser<'_> {
    /// `Name[A, B] :: body`. The colon kind (`:`, `::`, `:::`) is kept
    /// as data on the node.
    pub(crate) fn parse_production(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let name = match self.parse_identifier()? {
            Some(name) => name,
            // Unreachable from the list engine, which only dispatches
            // here on an identifier-like token.
            None => self.add_node(NodeKind::Identifier { name: Name::EMPTY }, start),
        };

        let parameters = if self.token() == SyntaxKind::OpenBracketToken && !self.starts_new_line()
        {
            Some(self.parse_parameter_list()?)
        } else {
            None
        };

        let colon = match self.token() {
            kind @ (SyntaxKind::ColonToken
            | SyntaxKind::ColonColonToken
            | SyntaxKind::ColonColonColonToken) => {
                self.next_token()?;
                kind
            }
            _ => {
                self.report_expected(SyntaxKind::ColonToken);
                SyntaxKind::ColonToken
            }
        };

        let body = self.parse_production_body()?;
        Ok(self.add_node(
            NodeKind::Production {
                name,
                parameters,
                colon,
                body,
            },
            start,
        ))
    }

    fn parse_parameter_list(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // [
        let elements = self.parse_list(ListContext::Parameters)?;
        self.expect(SyntaxKind::CloseBracketToken)?;
        Ok(self.add_node(NodeKind::ParameterList { elements }, start))
    }

    pub(crate) fn parse_parameter(&mut self) -> Result<Option<NodeId>, Canceled> {
        let start = self.token_start();
        match self.parse_identifier()? {
            Some(name) => Ok(Some(self.add_node(NodeKind::Parameter { name }, start))),
            None => Ok(None),
        }
    }

    /// `?Name`, `+Name`, `~Name`, or a bare `Name` in relaxed form.
    pub(crate) fn parse_argument(&mut self) -> Result<Option<NodeId>, Canceled> {
        let start = self.token_start();
        let operator = match self.token() {
            kind @ (SyntaxKind::QuestionToken | SyntaxKind::PlusToken | SyntaxKind::TildeToken) => {
                self.next_token()?;
                Some(kind)
            }
            _ => None,
        };
        let name = self.parse_identifier()?;
        if operator.is_none() && name.is_none() {
            return Ok(None);
        }
        Ok(Some(self.add_node(NodeKind::Argument { operator, name }, start)))
    }

    fn parse_production_body(&mut self) -> Result<Option<NodeId>, Canceled> {
        if self.at_one_of()? {
            return self.parse_one_of_list().map(Some);
        }
        if !self.starts_new_line() && self.token() != SyntaxKind::EndOfFileToken {
            return self.parse_right_hand_side().map(Some);
        }
        if self.starts_new_line() && self.token_flags().contains(TokenFlags::PRECEDING_INDENT) {
            let start = self.token_start();
            let elements = self.parse_list(ListContext::RightHandSides)?;
            return Ok(Some(
                self.add_node(NodeKind::RightHandSideList { elements }, start),
            ));
        }
        Ok(None)
    }

    /// Both words on the current line; `one` alone is an ordinary
    /// nonterminal reference.
    pub(crate) fn at_one_of(&mut self) -> Result<bool, Canceled> {
        if self.token() != SyntaxKind::OneKeyword || self.starts_new_line() {
            return Ok(false);
        }
        let found = self.lookahead(|p| {
            p.next_token()?;
            Ok((p.token() == SyntaxKind::OfKeyword && !p.starts_new_line()).then_some(()))
        })?;
        Ok(found.is_some())
    }

    fn parse_one_of_list(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // one
        self.next_token()?; // of
        let terminals = if !self.starts_new_line() && self.token() != SyntaxKind::EndOfFileToken {
            self.parse_list(ListContext::OneOfList)?
        } else if self.token_flags().contains(TokenFlags::PRECEDING_INDENT) {
            self.parse_list(ListContext::OneOfListIndented)?
        } else {
            self.report(codes::TERMINAL_LITERAL_EXPECTED, vec![]);
            gram_syntax::NodeList::EMPTY
        };
        Ok(self.add_node(NodeKind::OneOfList { terminals }, start))
    }

    /// One terminal in a `one of` table.
    pub(crate) fn parse_one_of_terminal(&mut self) -> Result<Option<NodeId>, Canceled> {
        match self.token() {
            SyntaxKind::TerminalLiteral => {
                let start = self.token_start();
                let text = self.token_name();
                self.next_token()?;
                let literal = self.add_node(NodeKind::TerminalLiteral { text }, start);
                Ok(Some(self.add_node(
                    NodeKind::Terminal {
                        literal,
                        question: false,
                    },
                    start,
                )))
            }
            SyntaxKind::UnicodeCharacterLiteral => {
                let start = self.token_start();
                let text = self.token_name();
                self.next_token()?;
                Ok(Some(
                    self.add_node(NodeKind::UnicodeCharacterLiteral { text }, start),
                ))
            }
            _ => {
                self.report(codes::TERMINAL_LITERAL_EXPECTED, vec![]);
                Ok(None)
            }
        }
    }

    /// One alternative: optional constraints, a symbol span, and an
    /// optional `#link` reference.
    pub(crate) fn parse_right_hand_side(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        let constraints = if self.at_constraints()? {
            Some(self.parse_constraints()?)
        } else {
            None
        };
        let head = if self.is_start_of_symbol() {
            Some(self.parse_symbol_span()?)
        } else {
            if constraints.is_none() {
                self.report(codes::INVALID_SYMBOL, vec![]);
            }
            None
        };
        let reference = if self.token() == SyntaxKind::HashToken && !self.starts_new_line() {
            let link_start = self.token_start();
            let text = self.token_name();
            self.next_token()?;
            Some(self.add_node(NodeKind::LinkReference { text }, link_start))
        } else {
            None
        };
        Ok(self.add_node(
            NodeKind::RightHandSide {
                constraints,
                head,
                reference,
            },
            start,
        ))
    }

    /// `[` starts constraints only when a `+` or `~` follows; anything
    /// else bracket-shaped here is an assertion and belongs to the span.
    fn at_constraints(&mut self) -> Result<bool, Canceled> {
        if self.token() != SyntaxKind::OpenBracketToken {
            return Ok(false);
        }
        let found = self.lookahead(|p| {
            p.next_token()?;
            Ok(
                matches!(p.token(), SyntaxKind::PlusToken | SyntaxKind::TildeToken)
                    .then_some(()),
            )
        })?;
        Ok(found.is_some())
    }

    fn parse_constraints(&mut self) -> Result<NodeId, Canceled> {
        let start = self.token_start();
        self.next_token()?; // [
        let elements = self.parse_list(ListContext::Constraints)?;
        self.expect(SyntaxKind::CloseBracketToken)?;
        Ok(self.add_node(NodeKind::Constraints { elements }, start))
    }
}
