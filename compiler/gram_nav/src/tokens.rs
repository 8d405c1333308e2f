//! Lazy token re-scanning for token-level navigation.
//!
//! The tree keeps no token stream; when the navigator descends to token
//! granularity it re-scans the current node's span. Leaf nodes whose
//! kind is itself a token kind are answered without scanning.

use std::rc::Rc;

use gram_diagnostic::{CancelToken, Diagnostics};
use gram_scanner::Scanner;
use gram_syntax::{NodeId, SourceFile, StringInterner, SyntaxKind, Token};
use tracing::trace;

pub(crate) fn compute_tokens(file: &SourceFile, node: NodeId) -> Rc<[Token]> {
    let entry = file.arena().node(node);
    let kind = entry.syntax_kind();
    if kind.is_token() {
        return Rc::from(vec![Token::new(kind, entry.span)]);
    }

    let span = entry.span;
    trace!(?node, start = span.start, end = span.end, "re-scan for tokens");

    // Names and diagnostics produced by the re-scan are throwaway; only
    // kinds and spans survive.
    let interner = StringInterner::new();
    let mut diagnostics = Diagnostics::new();
    let mut scanner = Scanner::new(
        file.filename(),
        file.text(),
        &interner,
        &mut diagnostics,
        CancelToken::new(),
    );
    let tokens = scanner.scan_range(span.start, |scanner| {
        let mut out = Vec::new();
        while let Ok(kind) = scanner.scan() {
            if kind == SyntaxKind::EndOfFileToken || scanner.token_pos() >= span.end {
                break;
            }
            if scanner.token_pos() < span.start {
                continue;
            }
            out.push(Token::new(kind, scanner.token_span()));
        }
        out
    });
    Rc::from(tokens)
}
