#![allow(clippy::unwrap_used)]

use gram_diagnostic::CancelToken;
use gram_syntax::{NodeId, NodeKind, SourceFile, StringInterner, SyntaxKind, TriviaKind};
use pretty_assertions::assert_eq;

use crate::parse_source_file;

fn parse(text: &str) -> SourceFile {
    let interner = StringInterner::new();
    parse_with(&interner, text)
}

fn parse_with(interner: &StringInterner, text: &str) -> SourceFile {
    parse_source_file("test.grammar", text, interner, &CancelToken::new()).unwrap()
}

fn find(file: &SourceFile, kind: SyntaxKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    file.arena().walk(file.root(), &mut |id| {
        if file.arena().kind(id) == kind {
            out.push(id);
        }
    });
    out
}

#[test]
fn simple_production() {
    let file = parse("A : `a` B");
    assert_eq!(file.diagnostics().len(), 0);

    let productions = find(&file, SyntaxKind::Production);
    assert_eq!(productions.len(), 1);
    match &file.arena().node(productions[0]).kind {
        NodeKind::Production {
            parameters,
            colon,
            body,
            ..
        } => {
            assert!(parameters.is_none());
            assert_eq!(*colon, SyntaxKind::ColonToken);
            assert!(body.is_some());
        }
        other => panic!("expected production, got {other:?}"),
    }
    assert_eq!(find(&file, SyntaxKind::SymbolSpan).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Terminal).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 1);
}

#[test]
fn parameters_and_arguments() {
    let file = parse("A[In, Yield] : B[?In] C[+In, ~Yield]");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::Parameter).len(), 2);

    let arguments = find(&file, SyntaxKind::Argument);
    assert_eq!(arguments.len(), 3);
    let operators: Vec<_> = arguments
        .iter()
        .map(|&id| match &file.arena().node(id).kind {
            NodeKind::Argument { operator, .. } => *operator,
            other => panic!("expected argument, got {other:?}"),
        })
        .collect();
    assert_eq!(
        operators,
        vec![
            Some(SyntaxKind::QuestionToken),
            Some(SyntaxKind::PlusToken),
            Some(SyntaxKind::TildeToken),
        ]
    );
}

#[test]
fn indented_right_hand_side_list() {
    let file = parse("A :\n  `a`\n  B C\n");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::RightHandSideList).len(), 1);
    assert_eq!(find(&file, SyntaxKind::RightHandSide).len(), 2);
    assert_eq!(find(&file, SyntaxKind::Terminal).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 2);

    // The first symbol of each alternative opens its line and must not
    // be skipped by the logical-line guard.
    for span in find(&file, SyntaxKind::SymbolSpan) {
        match &file.arena().node(span).kind {
            NodeKind::SymbolSpan { elements } => {
                assert!(!file.arena().list(*elements).is_empty());
            }
            other => panic!("expected symbol span, got {other:?}"),
        }
    }
}

#[test]
fn one_of_on_one_line() {
    let file = parse("Digit : one of `0` `1` `2`");
    assert_eq!(file.diagnostics().len(), 0);

    let lists = find(&file, SyntaxKind::OneOfList);
    assert_eq!(lists.len(), 1);
    match &file.arena().node(lists[0]).kind {
        NodeKind::OneOfList { terminals } => assert_eq!(terminals.len(), 3),
        other => panic!("expected one-of list, got {other:?}"),
    }
}

#[test]
fn one_of_with_indented_rows() {
    let file = parse("Keyword :: one of\n  `break` `case`\n  `catch` `class`\n");
    assert_eq!(file.diagnostics().len(), 0);

    let productions = find(&file, SyntaxKind::Production);
    match &file.arena().node(productions[0]).kind {
        NodeKind::Production { colon, .. } => assert_eq!(*colon, SyntaxKind::ColonColonToken),
        other => panic!("expected production, got {other:?}"),
    }
    match &file.arena().node(find(&file, SyntaxKind::OneOfList)[0]).kind {
        NodeKind::OneOfList { terminals } => assert_eq!(terminals.len(), 4),
        other => panic!("expected one-of list, got {other:?}"),
    }
}

#[test]
fn but_not_symbol() {
    let file = parse("Identifier :: IdentifierName but not ReservedWord");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::ButNotSymbol).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 2);
}

#[test]
fn but_not_one_of() {
    let file = parse("A :: B but not one of `c` or `d` or `e`");
    assert_eq!(file.diagnostics().len(), 0);

    let one_ofs = find(&file, SyntaxKind::OneOfSymbol);
    assert_eq!(one_ofs.len(), 1);
    match &file.arena().node(one_ofs[0]).kind {
        NodeKind::OneOfSymbol { symbols } => assert_eq!(symbols.len(), 3),
        other => panic!("expected one-of symbol, got {other:?}"),
    }
}

#[test]
fn lookahead_assertion_with_symbol_set() {
    let file = parse("A : [lookahead ∉ { `a`, `b` }] B");
    assert_eq!(file.diagnostics().len(), 0);

    let assertions = find(&file, SyntaxKind::LookaheadAssertion);
    assert_eq!(assertions.len(), 1);
    match &file.arena().node(assertions[0]).kind {
        NodeKind::LookaheadAssertion { operator, operand } => {
            assert_eq!(*operator, SyntaxKind::NotAnElementOfToken);
            assert!(operand.is_some());
        }
        other => panic!("expected lookahead assertion, got {other:?}"),
    }
    match &file.arena().node(find(&file, SyntaxKind::SymbolSet)[0]).kind {
        NodeKind::SymbolSet { elements } => assert_eq!(elements.len(), 2),
        other => panic!("expected symbol set, got {other:?}"),
    }
}

#[test]
fn no_symbol_here_assertion() {
    let file = parse("A : B [no LineTerminator here] C");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::NoSymbolHereAssertion).len(), 1);
    // B, LineTerminator, and C.
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 3);
}

#[test]
fn empty_and_lexical_goal_assertions() {
    let file = parse("A :\n  [empty]\n  [lexical goal InputElementDiv] B\n");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::EmptyAssertion).len(), 1);
    assert_eq!(find(&file, SyntaxKind::LexicalGoalAssertion).len(), 1);
}

#[test]
fn unrecognized_assertion_costs_one_diagnostic() {
    let file = parse("A : [frobnicate all the things] B");
    assert_eq!(file.diagnostics().len(), 1);
    assert_eq!(find(&file, SyntaxKind::InvalidAssertion).len(), 1);
    // The span still picks up B after the bad assertion.
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 1);
}

#[test]
fn unicode_character_range() {
    let file = parse("WhiteSpace :: <TAB> through <SPACE>");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::UnicodeCharacterRange).len(), 1);
    assert_eq!(find(&file, SyntaxKind::UnicodeCharacterLiteral).len(), 2);
}

#[test]
fn line_prose_with_embedded_symbols() {
    let file = parse("A :: > any char except `\\` or |B|");
    assert_eq!(file.diagnostics().len(), 0);

    let proses = find(&file, SyntaxKind::Prose);
    assert_eq!(proses.len(), 1);
    assert_eq!(find(&file, SyntaxKind::Terminal).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 1);
}

#[test]
fn bracketed_prose_closes_with_bracket() {
    let file = parse("A :: [> prefix `x` suffix] B");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::Prose).len(), 1);
    // B is a sibling symbol after the prose, not part of it.
    assert_eq!(find(&file, SyntaxKind::Nonterminal).len(), 1);
    assert_eq!(find(&file, SyntaxKind::SymbolSpan).len(), 1);
}

#[test]
fn meta_directives() {
    let interner = StringInterner::new();
    let file = parse_with(
        &interner,
        "@import \"tokens.grammar\"\n@define noStrictParametricProductions true\n@line 5 \"src.grammar\"\nA : `a`",
    );
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(file.imports(), ["tokens.grammar".to_string()]);

    let defines = find(&file, SyntaxKind::Define);
    assert_eq!(defines.len(), 1);
    match &file.arena().node(defines[0]).kind {
        NodeKind::Define { key, value } => {
            let key = key.unwrap();
            match &file.arena().node(key).kind {
                NodeKind::Identifier { name } => {
                    assert_eq!(interner.resolve(*name), "noStrictParametricProductions");
                }
                other => panic!("expected identifier, got {other:?}"),
            }
            let value = value.unwrap();
            match &file.arena().node(value).kind {
                NodeKind::KeywordValue { keyword } => {
                    assert_eq!(*keyword, SyntaxKind::TrueKeyword);
                }
                other => panic!("expected keyword value, got {other:?}"),
            }
        }
        other => panic!("expected define, got {other:?}"),
    }

    let lines = find(&file, SyntaxKind::Line);
    assert_eq!(lines.len(), 1);
    match &file.arena().node(lines[0]).kind {
        NodeKind::Line { number, path } => {
            match &file.arena().node(number.unwrap()).kind {
                NodeKind::NumberLiteral { value } => assert_eq!(*value, 5),
                other => panic!("expected number, got {other:?}"),
            }
            assert!(path.is_some());
        }
        other => panic!("expected line directive, got {other:?}"),
    }
}

#[test]
fn link_reference() {
    let interner = StringInterner::new();
    let file = parse_with(&interner, "A : `a` #sec-a");
    assert_eq!(file.diagnostics().len(), 0);

    let references = find(&file, SyntaxKind::LinkReference);
    assert_eq!(references.len(), 1);
    match &file.arena().node(references[0]).kind {
        NodeKind::LinkReference { text } => assert_eq!(interner.resolve(*text), "sec-a"),
        other => panic!("expected link reference, got {other:?}"),
    }
}

#[test]
fn missing_colon_recovers_to_next_production() {
    let file = parse("A `a`\nB : `b`");
    assert_eq!(file.diagnostics().len(), 1);
    assert_eq!(find(&file, SyntaxKind::Production).len(), 2);
    assert_eq!(find(&file, SyntaxKind::Terminal).len(), 2);
}

#[test]
fn unclosed_parameter_list_keeps_the_body() {
    let file = parse("A[In : `a`");
    assert_eq!(file.diagnostics().len(), 1);
    assert_eq!(find(&file, SyntaxKind::Parameter).len(), 1);
    assert_eq!(find(&file, SyntaxKind::Terminal).len(), 1);
}

#[test]
fn bracket_after_nonterminal_is_not_arguments() {
    let file = parse("A : B [lookahead == `c`]");
    assert_eq!(file.diagnostics().len(), 0);

    let nonterminals = find(&file, SyntaxKind::Nonterminal);
    assert_eq!(nonterminals.len(), 1);
    match &file.arena().node(nonterminals[0]).kind {
        NodeKind::Nonterminal { arguments, .. } => assert!(arguments.is_none()),
        other => panic!("expected nonterminal, got {other:?}"),
    }
    assert_eq!(find(&file, SyntaxKind::LookaheadAssertion).len(), 1);
}

#[test]
fn constraints_open_a_right_hand_side() {
    let file = parse("A[In] :\n  [+In] `a`\n  [~In] `b`\n");
    assert_eq!(file.diagnostics().len(), 0);
    assert_eq!(find(&file, SyntaxKind::Constraints).len(), 2);
    assert_eq!(find(&file, SyntaxKind::RightHandSide).len(), 2);
}

#[test]
fn comment_trivia_attaches_to_productions() {
    let file = parse("// detached banner\n\nA : `a` // trailing note\n");
    assert_eq!(file.diagnostics().len(), 0);

    let trivia = file.trivia();
    assert_eq!(trivia.len(), 2);
    assert_eq!(trivia.detached().len(), 1);

    let production = find(&file, SyntaxKind::Production)[0];
    let trailing = trivia.trailing(production);
    assert_eq!(trailing.len(), 1);
    assert_eq!(
        trivia.get(trailing[0]).kind,
        TriviaKind::SingleLineComment
    );
}

#[test]
fn html_tags_bracket_a_production() {
    let file = parse("<emu-clause>\nA : `a`\n</emu-clause>\n");
    assert_eq!(file.diagnostics().len(), 0);

    let trivia = file.trivia();
    assert_eq!(trivia.len(), 2);
    let production = find(&file, SyntaxKind::Production)[0];
    assert_eq!(trivia.leading(production).len(), 1);
    assert_eq!(trivia.trailing(production).len(), 1);
}

#[test]
fn canceled_parse_returns_err() {
    let interner = StringInterner::new();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(parse_source_file("test.grammar", "A : `a`", &interner, &cancel).is_err());
}

#[test]
fn node_spans_are_well_formed_and_siblings_are_ordered() {
    let text = "A[In] : B[?In] but not `c`\n\nC :: one of\n\t`x` `y`\n\n@define noStrictParametricProductions true\n";
    let file = parse(text);

    file.arena().walk(file.root(), &mut |id| {
        let span = file.arena().span(id);
        assert!(span.start <= span.end, "inverted span on {:?}", file.arena().kind(id));

        let children = file.arena().children(id);
        for pair in children.windows(2) {
            assert!(
                file.arena().span(pair[0]).end <= file.arena().span(pair[1]).start,
                "overlapping siblings under {:?}",
                file.arena().kind(id)
            );
        }
    });
}

#[test]
fn reparsing_the_same_text_is_deterministic() {
    let text = "A[In, Yield] : [lookahead ∉ { `a`, `b` }] B[?In]\n\nB : `b` C\n";
    let first = parse(text);
    let second = parse(text);

    let shape = |file: &SourceFile| {
        let mut out = Vec::new();
        file.arena().walk(file.root(), &mut |id| {
            out.push((file.arena().kind(id), file.arena().span(id)));
        });
        out
    };
    assert_eq!(shape(&first), shape(&second));
    assert_eq!(first.diagnostics().len(), second.diagnostics().len());
}

#[test]
fn parsed_files_are_debug_printable() {
    let file = parse("A : `a`");
    let rendered = format!("{file:?}");
    assert!(rendered.contains("test.grammar"));
}

#[test]
fn empty_file_parses_to_an_empty_root() {
    let file = parse("");
    assert_eq!(file.diagnostics().len(), 0);
    match &file.arena().node(file.root()).kind {
        NodeKind::SourceFile { elements } => assert!(elements.is_empty()),
        other => panic!("expected source file, got {other:?}"),
    }
}
