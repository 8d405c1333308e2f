//! Recursive descent parser for the Gram grammar language.
//!
//! [`parse_source_file`] never fails for malformed text — errors become
//! diagnostics on the returned [`SourceFile`] and parsing continues with
//! bounded, guaranteed-progress recovery. The only error path is
//! cooperative cancellation.
//!
//! Every bracketed, indented, or separated list goes through one generic
//! list engine (see `list`), parameterized by a [`ListContext`] that
//! supplies the start/terminator predicates, the element parser, the
//! separator policy, and the recovery set.

mod grammar;
mod list;
mod recovery;
mod trivia;

#[cfg(test)]
mod tests;

pub use list::ListContext;
pub use recovery::TokenSet;

use gram_diagnostic::{codes, CancelToken, Canceled, Diagnostics, LineMap, Span};
use gram_scanner::Scanner;
use gram_syntax::{
    Name, NodeId, NodeKind, SourceFile, StringInterner, SyntaxArena, SyntaxKind, TokenFlags,
    TriviaTable,
};

/// Parse one grammar file.
///
/// The interner is host-owned and shared across files so names compare
/// equal across a multi-file grammar.
#[tracing::instrument(level = "debug", skip_all, fields(filename = %filename))]
pub fn parse_source_file(
    filename: &str,
    text: &str,
    interner: &StringInterner,
    cancel: &CancelToken,
) -> Result<SourceFile, Canceled> {
    let line_map = LineMap::new(text);
    let mut diagnostics = Diagnostics::new();
    diagnostics.set_source_file(filename, &line_map);

    let outcome = {
        let mut parser = Parser::new(filename, text, interner, &mut diagnostics, cancel.clone())?;
        parser.run()?
    };

    Ok(SourceFile::new(
        filename.to_string(),
        text.to_string(),
        line_map,
        outcome.arena,
        outcome.root,
        outcome.imports,
        diagnostics,
        outcome.trivia,
    ))
}

struct ParseOutcome {
    arena: SyntaxArena,
    root: NodeId,
    imports: Vec<String>,
    trivia: TriviaTable,
}

/// Parser state. One instance parses one file.
pub(crate) struct Parser<'a> {
    scanner: Scanner<'a>,
    arena: SyntaxArena,
    imports: Vec<String>,
    cancel: CancelToken,
    /// End of the most recently consumed token; node spans finish here
    /// so trailing whitespace stays outside every node.
    last_token_end: u32,
}

impl<'a> Parser<'a> {
    fn new(
        filename: &'a str,
        text: &'a str,
        interner: &'a StringInterner,
        diagnostics: &'a mut Diagnostics,
        cancel: CancelToken,
    ) -> Result<Self, Canceled> {
        let mut scanner = Scanner::new(filename, text, interner, diagnostics, cancel.clone());
        scanner.scan()?;
        Ok(Parser {
            scanner,
            arena: SyntaxArena::new(),
            imports: Vec::new(),
            cancel,
            last_token_end: 0,
        })
    }

    fn run(&mut self) -> Result<ParseOutcome, Canceled> {
        let root = self.parse_file()?;
        let trivia = trivia::attach_trivia(
            &self.arena,
            root,
            self.scanner.all_trivia(),
            self.scanner.text(),
        );
        Ok(ParseOutcome {
            arena: std::mem::take(&mut self.arena),
            root,
            imports: std::mem::take(&mut self.imports),
            trivia,
        })
    }

    // ─── Token plumbing ───────────────────────────────────────────────

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    pub(crate) fn token_flags(&self) -> TokenFlags {
        self.scanner.token_flags()
    }

    #[inline]
    pub(crate) fn token_span(&self) -> Span {
        self.scanner.token_span()
    }

    #[inline]
    pub(crate) fn token_start(&self) -> u32 {
        self.scanner.token_pos()
    }

    pub(crate) fn next_token(&mut self) -> Result<(), Canceled> {
        self.last_token_end = self.scanner.pos();
        self.scanner.scan()?;
        Ok(())
    }

    /// The token begins a fresh logical line. Wrapped continuations
    /// (deeper than the open block) do not count.
    pub(crate) fn starts_new_line(&self) -> bool {
        let flags = self.token_flags();
        flags.contains(TokenFlags::PRECEDING_LINE_TERMINATOR)
            && !flags.contains(TokenFlags::LINE_CONTINUATION)
    }

    /// Identifier or any keyword; keywords are contextual and usable as
    /// names almost everywhere.
    pub(crate) fn identifier_like(&self) -> bool {
        let token = self.token();
        token == SyntaxKind::Identifier || token.is_keyword()
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> Result<bool, Canceled> {
        if self.token() == kind {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume `kind` or report `'{kind}' expected` at the current token.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> Result<bool, Canceled> {
        if self.eat(kind)? {
            Ok(true)
        } else {
            self.report_expected(kind);
            Ok(false)
        }
    }

    pub(crate) fn report_expected(&mut self, kind: SyntaxKind) {
        let span = self.token_span();
        self.scanner
            .diagnostics()
            .report_at(span, codes::TOKEN_EXPECTED, vec![kind.display_text()]);
    }

    pub(crate) fn report(&mut self, code: u32, args: Vec<String>) {
        let span = self.token_span();
        self.scanner.diagnostics().report_at(span, code, args);
    }

    /// Cooked value of the current token, interned.
    pub(crate) fn token_name(&self) -> Name {
        self.scanner.token_name()
    }

    pub(crate) fn token_text(&self) -> &str {
        self.scanner.token_text()
    }

    // ─── Nodes ────────────────────────────────────────────────────────

    /// Finish a node whose first token began at `start`.
    pub(crate) fn add_node(&mut self, kind: NodeKind, start: u32) -> NodeId {
        let end = self.last_token_end.max(start);
        self.arena.add(kind, Span::new(start, end))
    }

    pub(crate) fn arena(&mut self) -> &mut SyntaxArena {
        &mut self.arena
    }

    /// An identifier (or contextual keyword) as a leaf node. Reports
    /// `Identifier expected` and returns `None` otherwise.
    pub(crate) fn parse_identifier(&mut self) -> Result<Option<NodeId>, Canceled> {
        if !self.identifier_like() {
            self.report(codes::IDENTIFIER_EXPECTED, vec![]);
            return Ok(None);
        }
        let start = self.token_start();
        let name = self.token_name();
        self.next_token()?;
        Ok(Some(self.add_node(NodeKind::Identifier { name }, start)))
    }

    pub(crate) fn parse_string_literal(&mut self) -> Result<Option<NodeId>, Canceled> {
        if self.token() != SyntaxKind::StringLiteral {
            self.report(codes::STRING_LITERAL_EXPECTED, vec![]);
            return Ok(None);
        }
        let start = self.token_start();
        let value = self.token_name();
        self.next_token()?;
        Ok(Some(self.add_node(NodeKind::StringLiteral { value }, start)))
    }

    pub(crate) fn parse_number_literal(&mut self) -> Result<Option<NodeId>, Canceled> {
        if self.token() != SyntaxKind::NumberLiteral {
            self.report(codes::NUMBER_LITERAL_EXPECTED, vec![]);
            return Ok(None);
        }
        let start = self.token_start();
        let value = match self.scanner.token_value().parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                self.report(codes::DIGIT_EXPECTED, vec![]);
                0
            }
        };
        self.next_token()?;
        Ok(Some(self.add_node(NodeKind::NumberLiteral { value }, start)))
    }

    // ─── Speculation ──────────────────────────────────────────────────

    /// Run `f` speculatively: scanner, arena, and import list all roll
    /// back unless `f` produced a value and this is not a lookahead.
    pub(crate) fn speculate<T>(
        &mut self,
        is_lookahead: bool,
        f: impl FnOnce(&mut Self) -> Result<Option<T>, Canceled>,
    ) -> Result<Option<T>, Canceled> {
        let scanner_snapshot = self.scanner.snapshot();
        let arena_checkpoint = self.arena.checkpoint();
        let imports_len = self.imports.len();
        let last_token_end = self.last_token_end;
        let result = f(self)?;
        if result.is_none() || is_lookahead {
            self.scanner.restore(scanner_snapshot);
            self.arena.truncate(arena_checkpoint);
            self.imports.truncate(imports_len);
            self.last_token_end = last_token_end;
        }
        Ok(result)
    }

    /// Peek ahead without committing anything.
    pub(crate) fn lookahead<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Option<T>, Canceled>,
    ) -> Result<Option<T>, Canceled> {
        self.speculate(true, f)
    }
}
