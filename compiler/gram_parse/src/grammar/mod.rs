//! Grammar rules, split by region of the language: file-level meta
//! directives, production structure, and symbol expressions.

mod meta;
mod production;
mod symbols;

use gram_diagnostic::Canceled;
use gram_syntax::{NodeId, NodeKind, SyntaxKind};

use crate::{ListContext, Parser};

impl Parser<'_> {
    /// The root rule: a flat list of meta directives and productions.
    pub(crate) fn parse_file(&mut self) -> Result<NodeId, Canceled> {
        let elements = self.parse_list(ListContext::SourceElements)?;
        let span = self.file_span();
        let node = self.arena().add(NodeKind::SourceFile { elements }, span);
        Ok(node)
    }

    fn file_span(&self) -> gram_diagnostic::Span {
        gram_diagnostic::Span::new(0, self.scanner.text().len() as u32)
    }

    pub(crate) fn parse_source_element(&mut self) -> Result<Option<NodeId>, Canceled> {
        if self.token() == SyntaxKind::AtToken {
            self.parse_meta_element()
        } else {
            self.parse_production().map(Some)
        }
    }
}
