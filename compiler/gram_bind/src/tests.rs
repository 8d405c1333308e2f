#![allow(clippy::unwrap_used)]

use gram_diagnostic::CancelToken;
use gram_parse::parse_source_file;
use gram_syntax::{SourceFile, StringInterner, SyntaxKind};
use pretty_assertions::assert_eq;

use crate::{bind_source_file, BindingTable, NodeKey, SymbolKind};

fn parse(interner: &StringInterner, filename: &str, text: &str) -> SourceFile {
    parse_source_file(filename, text, interner, &CancelToken::new()).unwrap()
}

fn bind(interner: &StringInterner, file: &SourceFile, table: &mut BindingTable) {
    bind_source_file(file, interner, table, &CancelToken::new()).unwrap();
}

#[test]
fn productions_declare_global_symbols() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a`\nB : A\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);

    assert!(table.is_bound("g.grammar"));
    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    let b = table
        .resolve_global(SymbolKind::Production, interner.intern("B"))
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(table.declarations(a).len(), 1);

    // Production symbols hang off the file symbol.
    let file_symbol = table
        .resolve_global(SymbolKind::SourceFile, interner.intern("g.grammar"))
        .unwrap();
    assert_eq!(table.symbol(a).parent(), Some(file_symbol));
}

#[test]
fn parameters_bind_into_production_locals() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A[In, Yield] : `a`\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);

    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    let in_param = table
        .resolve_local(a, SymbolKind::Parameter, interner.intern("In"))
        .unwrap();
    assert_eq!(table.symbol(in_param).parent(), Some(a));
    assert!(table
        .resolve_local(a, SymbolKind::Parameter, interner.intern("Yield"))
        .is_some());
    assert!(table
        .resolve_local(a, SymbolKind::Parameter, interner.intern("Await"))
        .is_none());
}

#[test]
fn redeclaration_shares_one_symbol() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a`\nA : `b`\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);

    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    assert_eq!(table.declarations(a).len(), 2);
}

#[test]
fn rebinding_a_file_is_a_noop() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a`\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);
    let symbols = table.symbol_count();

    bind(&interner, &file, &mut table);
    assert_eq!(table.symbol_count(), symbols);
    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    assert_eq!(table.declarations(a).len(), 1);
}

#[test]
fn same_name_across_files_resolves_to_one_symbol() {
    let interner = StringInterner::new();
    let first = parse(&interner, "lexical.grammar", "A : `a`\n");
    let second = parse(&interner, "syntactic.grammar", "A : `b`\n");
    let mut table = BindingTable::new();
    bind(&interner, &first, &mut table);
    bind(&interner, &second, &mut table);

    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    let declarations = table.declarations(a);
    assert_eq!(declarations.len(), 2);
    assert_ne!(declarations[0].file, declarations[1].file);
}

#[test]
fn parent_map_walks_to_the_root() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a` B\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);
    let file_id = table.file_id("g.grammar").unwrap();

    // Find the terminal node and walk up.
    let mut terminal = None;
    file.arena().walk(file.root(), &mut |id| {
        if file.arena().kind(id) == SyntaxKind::Terminal {
            terminal = Some(id);
        }
    });
    let mut key = NodeKey::new(file_id, terminal.unwrap());
    let mut kinds = Vec::new();
    while let Some(parent) = table.parent(key) {
        kinds.push(file.arena().kind(parent.node));
        key = parent;
    }
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::SymbolSpan,
            SyntaxKind::RightHandSide,
            SyntaxKind::Production,
            SyntaxKind::SourceFile,
        ]
    );
}

#[test]
fn canceled_bind_leaves_the_table_untouched() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a`\n");
    let mut table = BindingTable::new();

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(bind_source_file(&file, &interner, &mut table, &cancel).is_err());
    assert!(!table.is_bound("g.grammar"));
    assert_eq!(table.symbol_count(), 0);
}

#[test]
fn references_recorded_by_hand_round_trip() {
    let interner = StringInterner::new();
    let file = parse(&interner, "g.grammar", "A : `a`\nB : A\n");
    let mut table = BindingTable::new();
    bind(&interner, &file, &mut table);
    let file_id = table.file_id("g.grammar").unwrap();

    let a = table
        .resolve_global(SymbolKind::Production, interner.intern("A"))
        .unwrap();
    let key = NodeKey::new(file_id, file.root());
    table.record_reference(a, key);
    table.record_reference(a, key);
    assert_eq!(table.references(a), [key]);
    assert_eq!(table.symbol_of(key), Some(a));
}
