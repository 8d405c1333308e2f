//! `@import`, `@define`, and `@line` directives.
//!
//! The parser is deliberately permissive here: it records whatever key
//! and value it finds as nodes and leaves validation (known keys, legal
//! values, line-number semantics) to the checker, so a typo in one
//! directive produces exactly one diagnostic.

use gram_diagnostic::{codes, Canceled};
use gram_syntax::{NodeId, NodeKind, SyntaxKind};

use crate::Parser;

impl Parser<'_> {
    pub(crate) fn parse_meta_element(&mut self) -> Result<Option<NodeId>, Canceled> {
        let start = self.token_start();
        self.next_token()?; // @
        match self.token() {
            SyntaxKind::ImportKeyword => self.parse_import(start).map(Some),
            SyntaxKind::DefineKeyword => self.parse_define(start).map(Some),
            SyntaxKind::LineKeyword => self.parse_line(start).map(Some),
            _ => {
                let text = format!("@{}", self.token_text());
                self.report(codes::UNEXPECTED_TOKEN, vec![text]);
                Ok(None)
            }
        }
    }

    fn parse_import(&mut self, start: u32) -> Result<NodeId, Canceled> {
        self.next_token()?; // import
        let path = if self.token() == SyntaxKind::StringLiteral && !self.starts_new_line() {
            self.imports.push(self.scanner.token_value().to_string());
            self.parse_string_literal()?
        } else {
            self.report(codes::STRING_LITERAL_EXPECTED, vec![]);
            None
        };
        Ok(self.add_node(NodeKind::Import { path }, start))
    }

    fn parse_define(&mut self, start: u32) -> Result<NodeId, Canceled> {
        self.next_token()?; // define
        let key = if self.identifier_like() && !self.starts_new_line() {
            self.parse_identifier()?
        } else {
            self.report(codes::DEFINE_KEY_EXPECTED, vec![]);
            None
        };
        let value = if self.starts_new_line() {
            None
        } else {
            self.parse_define_value()?
        };
        Ok(self.add_node(
            NodeKind::Define { key, value },
            start,
        ))
    }

    /// `true`, `false`, and `default` become keyword-value leaves; any
    /// other word is kept as an identifier for the checker to flag.
    fn parse_define_value(&mut self) -> Result<Option<NodeId>, Canceled> {
        match self.token() {
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword | SyntaxKind::DefaultKeyword => {
                let start = self.token_start();
                let keyword = self.token();
                self.next_token()?;
                Ok(Some(self.add_node(NodeKind::KeywordValue { keyword }, start)))
            }
            SyntaxKind::Identifier => self.parse_identifier(),
            _ => {
                let text = self.token_text().to_string();
                self.report(codes::INVALID_DEFINE_VALUE, vec![text]);
                Ok(None)
            }
        }
    }

    /// `@line 42 "original.grammar"` or `@line default`.
    fn parse_line(&mut self, start: u32) -> Result<NodeId, Canceled> {
        self.next_token()?; // line
        let (number, path) = match self.token() {
            SyntaxKind::NumberLiteral if !self.starts_new_line() => {
                let number = self.parse_number_literal()?;
                let path = if self.token() == SyntaxKind::StringLiteral && !self.starts_new_line()
                {
                    self.parse_string_literal()?
                } else {
                    None
                };
                (number, path)
            }
            SyntaxKind::DefaultKeyword if !self.starts_new_line() => {
                let keyword_start = self.token_start();
                self.next_token()?;
                let keyword = self.add_node(
                    NodeKind::KeywordValue {
                        keyword: SyntaxKind::DefaultKeyword,
                    },
                    keyword_start,
                );
                (Some(keyword), None)
            }
            _ => {
                self.report(codes::LINE_NUMBER_EXPECTED, vec![]);
                (None, None)
            }
        };
        Ok(self.add_node(
            NodeKind::Line { number, path },
            start,
        ))
    }
}
