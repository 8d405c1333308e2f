#![allow(clippy::unwrap_used)]

use gram_diagnostic::CancelToken;
use gram_parse::parse_source_file;
use gram_syntax::{SourceFile, StringInterner, SyntaxKind};
use pretty_assertions::assert_eq;

use crate::Navigator;

fn parse(text: &str) -> SourceFile {
    let interner = StringInterner::new();
    parse_source_file("test.grammar", text, &interner, &CancelToken::new()).unwrap()
}

#[test]
fn starts_at_the_root() {
    let file = parse("A : `a`");
    let nav = Navigator::new(&file);
    assert_eq!(nav.kind(), SyntaxKind::SourceFile);
    assert_eq!(nav.depth(), 0);
    assert_eq!(nav.parent_kind(), None);
}

#[test]
fn walks_children_and_siblings_across_edges() {
    let file = parse("A[In] : `a`");
    let mut nav = Navigator::new(&file);

    assert!(nav.move_to_first_child());
    assert_eq!(nav.kind(), SyntaxKind::Production);
    assert_eq!(nav.parent_kind(), Some(SyntaxKind::SourceFile));

    // Production edges in order: name, parameters, body.
    assert!(nav.move_to_first_child());
    assert_eq!(nav.kind(), SyntaxKind::Identifier);
    assert!(nav.move_to_next_sibling());
    assert_eq!(nav.kind(), SyntaxKind::ParameterList);
    assert!(nav.move_to_next_sibling());
    assert_eq!(nav.kind(), SyntaxKind::RightHandSide);
    assert!(!nav.move_to_next_sibling());
    assert_eq!(nav.kind(), SyntaxKind::RightHandSide);

    assert!(nav.move_to_previous_sibling());
    assert_eq!(nav.kind(), SyntaxKind::ParameterList);
    assert!(nav.move_to_parent());
    assert_eq!(nav.kind(), SyntaxKind::Production);
}

#[test]
fn last_child_and_named_edges() {
    let file = parse("A[In] : `a`");
    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child());

    let mut last = nav.clone();
    assert!(last.move_to_last_child());
    assert_eq!(last.kind(), SyntaxKind::RightHandSide);

    assert!(nav.move_to_child_named("body"));
    assert_eq!(nav.kind(), SyntaxKind::RightHandSide);
    assert!(nav.move_to_parent());
    assert!(!nav.move_to_child_named("nonesuch"));
    assert_eq!(nav.kind(), SyntaxKind::Production);
}

#[test]
fn siblings_walk_list_elements() {
    let file = parse("A :\n  `a`\n  `b`\n  `c`\n");
    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child()); // production
    assert!(nav.move_to_child_named("body"));
    assert_eq!(nav.kind(), SyntaxKind::RightHandSideList);
    assert!(nav.move_to_first_child());
    assert_eq!(nav.kind(), SyntaxKind::RightHandSide);
    assert!(nav.move_to_next_sibling());
    assert!(nav.move_to_next_sibling());
    assert!(!nav.move_to_next_sibling());
    assert!(nav.move_to_previous_sibling());
    assert!(nav.move_to_previous_sibling());
    assert!(!nav.move_to_previous_sibling());
}

#[test]
fn failed_moves_leave_the_cursor_alone() {
    let file = parse("A : `a`");
    let mut nav = Navigator::new(&file);
    let node = nav.node();
    assert!(!nav.move_to_parent());
    assert!(!nav.move_to_next_sibling());
    assert!(!nav.move_to_previous_sibling());
    assert_eq!(nav.node(), node);
}

#[test]
fn position_lookup_innermost_and_outermost() {
    let text = "A : `a` B";
    let file = parse(text);
    let pos = text.find('B').unwrap() as u32;

    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_position(pos, false));
    assert_eq!(nav.kind(), SyntaxKind::Identifier);
    assert_eq!(nav.parent_kind(), Some(SyntaxKind::Nonterminal));

    assert!(nav.move_to_position(pos, true));
    assert_eq!(nav.kind(), SyntaxKind::Production);

    // Out of range: unchanged.
    assert!(!nav.move_to_position(text.len() as u32 + 10, false));
    assert_eq!(nav.kind(), SyntaxKind::Production);
}

#[test]
fn token_moves_rescan_the_node_span() {
    let text = "A : `a`";
    let file = parse(text);
    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child()); // production

    assert!(nav.move_to_first_token());
    let first = nav.token().unwrap();
    assert_eq!(first.kind, SyntaxKind::Identifier);
    assert_eq!(first.pos(), 0);

    assert!(nav.move_to_next_token());
    assert_eq!(nav.token().unwrap().kind, SyntaxKind::ColonToken);
    assert!(nav.move_to_next_token());
    assert_eq!(nav.token().unwrap().kind, SyntaxKind::TerminalLiteral);
    assert!(!nav.move_to_next_token());

    assert!(nav.move_to_previous_token());
    assert_eq!(nav.token().unwrap().kind, SyntaxKind::ColonToken);

    let mut last = Navigator::new(&file);
    assert!(last.move_to_first_child());
    assert!(last.move_to_last_token());
    assert_eq!(last.token().unwrap().kind, SyntaxKind::TerminalLiteral);
}

#[test]
fn touching_token_at_position() {
    let text = "A : `a`";
    let file = parse(text);
    let colon = text.find(':').unwrap() as u32;

    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child());
    assert!(nav.move_to_touching_token(colon));
    assert_eq!(nav.token().unwrap().kind, SyntaxKind::ColonToken);

    // The right edge of a token still touches it.
    assert!(nav.move_to_touching_token(colon + 1));
    assert_eq!(nav.token().unwrap().kind, SyntaxKind::ColonToken);
}

#[test]
fn probe_restores_on_failure() {
    let file = parse("A : `a`");
    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child());
    let before = nav.node();

    let result: Option<()> = nav.probe(|nav| {
        assert!(nav.move_to_first_child());
        None
    });
    assert!(result.is_none());
    assert_eq!(nav.node(), before);

    let result = nav.probe(|nav| nav.move_to_first_child().then(|| nav.node()));
    assert!(result.is_some());
    assert_eq!(nav.kind(), SyntaxKind::Identifier);
}

#[test]
fn clone_is_independent() {
    let file = parse("A : `a`\nB : `b`\n");
    let mut nav = Navigator::new(&file);
    assert!(nav.move_to_first_child());

    let mut other = nav.clone();
    assert!(other.move_to_next_sibling());
    assert_eq!(nav.kind(), SyntaxKind::Production);
    assert_ne!(nav.node(), other.node());
}
