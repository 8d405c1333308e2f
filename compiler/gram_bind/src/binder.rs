//! The per-file bind pass.
//!
//! Binding walks the tree over reflection edges, records every parent
//! edge, declares productions into the global scope and parameters into
//! the enclosing production's locals. All output goes to a scratch table
//! that is merged into the caller's [`BindingTable`] only when the walk
//! completes; a canceled bind leaves the table exactly as it was.

use gram_diagnostic::{CancelToken, Canceled};
use gram_syntax::{Name, NodeId, NodeKind, SourceFile, StringInterner};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::{BindingTable, FileId, NodeKey, Symbol, SymbolId, SymbolKind, SymbolTable};

/// Bind one parsed file. A filename already present in the table is a
/// no-op; binding the same file object twice is therefore idempotent.
#[tracing::instrument(level = "debug", skip_all, fields(filename = %file.filename()))]
pub fn bind_source_file(
    file: &SourceFile,
    interner: &StringInterner,
    table: &mut BindingTable,
    cancel: &CancelToken,
) -> Result<(), Canceled> {
    cancel.check()?;
    if table.is_bound(file.filename()) {
        trace!("already bound");
        return Ok(());
    }

    let file_id = table.next_file_id();
    let mut binder = Binder {
        file,
        file_id,
        table,
        cancel,
        out: Scratch::default(),
        file_symbol: SymbolId(0),
    };
    let file_name = interner.intern(file.filename());
    binder.file_symbol = binder.declare_global(SymbolKind::SourceFile, file_name, None);
    let root = file.root();
    binder.record_declaration(binder.file_symbol, root);
    binder.bind(root, None)?;

    let scratch = binder.out;
    table.commit(file.filename(), scratch);
    Ok(())
}

/// Bind output not yet merged into the caller's table.
#[derive(Default)]
pub(crate) struct Scratch {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) globals: SymbolTable,
    /// Parameter entries destined for a production symbol's locals.
    pub(crate) locals: FxHashMap<(SymbolId, SymbolKind, Name), SymbolId>,
    pub(crate) parents: Vec<(NodeKey, NodeKey)>,
    pub(crate) node_symbols: Vec<(NodeKey, SymbolId)>,
    pub(crate) declarations: Vec<(SymbolId, NodeKey)>,
}

struct Binder<'a> {
    file: &'a SourceFile,
    file_id: FileId,
    table: &'a BindingTable,
    cancel: &'a CancelToken,
    out: Scratch,
    file_symbol: SymbolId,
}

impl Binder<'_> {
    fn key(&self, node: NodeId) -> NodeKey {
        NodeKey::new(self.file_id, node)
    }

    fn bind(&mut self, node: NodeId, scope: Option<SymbolId>) -> Result<(), Canceled> {
        self.cancel.check()?;
        let arena = self.file.arena();
        let mut child_scope = scope;
        match &arena.node(node).kind {
            NodeKind::Production { name, .. } => {
                let symbol = self.declare_global(
                    SymbolKind::Production,
                    self.identifier_name(*name),
                    Some(self.file_symbol),
                );
                self.record_declaration(symbol, node);
                self.out.node_symbols.push((self.key(*name), symbol));
                child_scope = Some(symbol);
            }
            NodeKind::Parameter { name } => {
                if let Some(production) = scope {
                    let symbol = self.declare_local(
                        production,
                        SymbolKind::Parameter,
                        self.identifier_name(*name),
                    );
                    self.record_declaration(symbol, node);
                    self.out.node_symbols.push((self.key(*name), symbol));
                }
            }
            _ => {}
        }
        for child in arena.children(node) {
            self.out.parents.push((self.key(child), self.key(node)));
            self.bind(child, child_scope)?;
        }
        Ok(())
    }

    fn identifier_name(&self, node: NodeId) -> Name {
        match &self.file.arena().node(node).kind {
            NodeKind::Identifier { name } => *name,
            _ => Name::EMPTY,
        }
    }

    fn record_declaration(&mut self, symbol: SymbolId, node: NodeId) {
        let key = self.key(node);
        self.out.node_symbols.push((key, symbol));
        self.out.declarations.push((symbol, key));
    }

    fn alloc(&mut self, name: Name, kind: SymbolKind, parent: Option<SymbolId>) -> SymbolId {
        let id = SymbolId(self.table.symbol_base() + self.out.symbols.len() as u32);
        self.out.symbols.push(Symbol::new(name, kind, parent));
        id
    }

    /// Find or create a global symbol. Earlier files win, so a name
    /// declared across files resolves to one symbol.
    fn declare_global(
        &mut self,
        kind: SymbolKind,
        name: Name,
        parent: Option<SymbolId>,
    ) -> SymbolId {
        if let Some(existing) = self
            .table
            .resolve_global(kind, name)
            .or_else(|| self.out.globals.get(kind, name))
        {
            return existing;
        }
        let id = self.alloc(name, kind, parent);
        self.out.globals.insert(kind, name, id);
        id
    }

    fn declare_local(&mut self, scope: SymbolId, kind: SymbolKind, name: Name) -> SymbolId {
        if let Some(existing) = self
            .lookup_local(scope, kind, name)
            .or_else(|| self.out.locals.get(&(scope, kind, name)).copied())
        {
            return existing;
        }
        let id = self.alloc(name, kind, Some(scope));
        self.out.locals.insert((scope, kind, name), id);
        id
    }

    /// A local scope may live in the merged table (a production first
    /// declared by an earlier file) or in this bind's scratch output.
    fn lookup_local(&self, scope: SymbolId, kind: SymbolKind, name: Name) -> Option<SymbolId> {
        let base = self.table.symbol_base();
        if scope.0 < base {
            self.table.resolve_local(scope, kind, name)
        } else {
            self.out.symbols[(scope.0 - base) as usize]
                .locals()
                .get(kind, name)
        }
    }
}
