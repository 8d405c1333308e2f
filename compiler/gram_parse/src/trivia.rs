//! Post-parse trivia attachment.
//!
//! The scanner collects comments and HTML tags positionally; this pass
//! decides which node each piece belongs to. A comment trails the node
//! that ends on its line, otherwise it leads the next node unless a
//! blank line separates them. HTML open tags lead, close tags trail.
//! Anything separated from both neighbors is detached.
//!
//! Attachment targets are always the outermost node at a boundary; the
//! file root and right-hand-side list wrappers never own trivia.

use gram_syntax::{NodeId, SyntaxArena, SyntaxKind, Trivia, TriviaKind, TriviaTable};

pub(crate) fn attach_trivia(
    arena: &SyntaxArena,
    root: NodeId,
    trivia: &[Trivia],
    text: &str,
) -> TriviaTable {
    let mut table = TriviaTable::new();
    if trivia.is_empty() {
        return table;
    }

    // (end, width, id) ascending and (start, -width, id) via sort keys,
    // so a partition point lands on the outermost boundary node.
    let mut by_end: Vec<(u32, u32, NodeId)> = Vec::new();
    let mut by_start: Vec<(u32, u32, NodeId)> = Vec::new();
    arena.walk(root, &mut |id| {
        if id == root || arena.kind(id) == SyntaxKind::RightHandSideList {
            return;
        }
        let span = arena.span(id);
        let width = span.end - span.start;
        by_end.push((span.end, width, id));
        by_start.push((span.start, width, id));
    });
    by_end.sort_by_key(|&(end, width, id)| (end, width, id.0));
    by_start.sort_by_key(|&(start, width, id)| (start, std::cmp::Reverse(width), id.0));

    let node_before = |pos: u32| -> Option<NodeId> {
        let index = by_end.partition_point(|&(end, _, _)| end <= pos);
        by_end.get(index.checked_sub(1)?).map(|&(_, _, id)| id)
    };
    let node_after = |pos: u32| -> Option<NodeId> {
        let index = by_start.partition_point(|&(start, _, _)| start < pos);
        by_start.get(index).map(|&(_, _, id)| id)
    };

    for piece in trivia {
        let id = table.add(*piece);
        let span = piece.span;
        let prev = node_before(span.start);
        let next = node_after(span.end);

        let trails = |node: NodeId| {
            let gap = &text[arena.span(node).end as usize..span.start as usize];
            !gap.contains(['\n', '\r'])
        };
        let leads = |node: NodeId| {
            let gap = &text[span.end as usize..arena.span(node).start as usize];
            !has_blank_line(gap)
        };

        match piece.kind {
            TriviaKind::HtmlCloseTag => match prev {
                Some(node) => table.attach_trailing(node, id),
                None => table.attach_detached(id),
            },
            TriviaKind::HtmlOpenTag => match next {
                Some(node) if leads(node) => table.attach_leading(node, id),
                _ => table.attach_detached(id),
            },
            TriviaKind::SingleLineComment | TriviaKind::MultiLineComment => {
                match (prev, next) {
                    (Some(node), _) if trails(node) => table.attach_trailing(node, id),
                    (_, Some(node)) if leads(node) => table.attach_leading(node, id),
                    _ => table.attach_detached(id),
                }
            }
        }
    }
    table
}

/// Does the slice contain a line with no content? `\r\n` counts as one
/// terminator; spaces and tabs do not count as content.
fn has_blank_line(slice: &str) -> bool {
    let bytes = slice.as_bytes();
    let mut after_terminator = false;
    let mut line_blank = true;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' | b'\n' => {
                if bytes[i] == b'\r' && i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    i += 1;
                }
                if after_terminator && line_blank {
                    return true;
                }
                after_terminator = true;
                line_blank = true;
            }
            b' ' | b'\t' => {}
            _ => line_blank = false,
        }
        i += 1;
    }
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_detection() {
        assert!(!has_blank_line("  \n"));
        assert!(!has_blank_line("a\nb"));
        assert!(has_blank_line("\n\n"));
        assert!(has_blank_line(" \r\n\t\r\n "));
        assert!(!has_blank_line("\r\n text \r\n"));
    }
}
