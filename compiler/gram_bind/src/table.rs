//! Symbols and the cross-file binding table.

use gram_syntax::{Name, NodeId};
use rustc_hash::FxHashMap;

/// Index of a bound file within a [`BindingTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct FileId(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    SourceFile,
    Production,
    Parameter,
}

/// A node in a specific file. Node ids alone are only unique per arena;
/// every cross-file map is keyed by this pair.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey {
    pub file: FileId,
    pub node: NodeId,
}

impl NodeKey {
    pub const fn new(file: FileId, node: NodeId) -> Self {
        NodeKey { file, node }
    }
}

/// One named entity: a file, a production, or a parameter. There is one
/// symbol per unique (scope, kind, name); re-declarations share it.
#[derive(Debug)]
pub struct Symbol {
    name: Name,
    kind: SymbolKind,
    parent: Option<SymbolId>,
    locals: SymbolTable,
}

impl Symbol {
    pub(crate) fn new(name: Name, kind: SymbolKind, parent: Option<SymbolId>) -> Self {
        Symbol {
            name,
            kind,
            parent,
            locals: SymbolTable::default(),
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn parent(&self) -> Option<SymbolId> {
        self.parent
    }

    pub fn locals(&self) -> &SymbolTable {
        &self.locals
    }

    pub(crate) fn locals_mut(&mut self) -> &mut SymbolTable {
        &mut self.locals
    }
}

/// Name → symbol maps, one per symbol kind.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    files: FxHashMap<Name, SymbolId>,
    productions: FxHashMap<Name, SymbolId>,
    parameters: FxHashMap<Name, SymbolId>,
}

impl SymbolTable {
    fn map(&self, kind: SymbolKind) -> &FxHashMap<Name, SymbolId> {
        match kind {
            SymbolKind::SourceFile => &self.files,
            SymbolKind::Production => &self.productions,
            SymbolKind::Parameter => &self.parameters,
        }
    }

    fn map_mut(&mut self, kind: SymbolKind) -> &mut FxHashMap<Name, SymbolId> {
        match kind {
            SymbolKind::SourceFile => &mut self.files,
            SymbolKind::Production => &mut self.productions,
            SymbolKind::Parameter => &mut self.parameters,
        }
    }

    pub fn get(&self, kind: SymbolKind, name: Name) -> Option<SymbolId> {
        self.map(kind).get(&name).copied()
    }

    pub fn insert(&mut self, kind: SymbolKind, name: Name, id: SymbolId) {
        self.map_mut(kind).insert(name, id);
    }

    /// Merge another table into this one. Existing entries win, so the
    /// first declaration of a name stays canonical.
    pub fn copy_from(&mut self, other: &SymbolTable) {
        for kind in [
            SymbolKind::SourceFile,
            SymbolKind::Production,
            SymbolKind::Parameter,
        ] {
            for (&name, &id) in other.map(kind) {
                self.map_mut(kind).entry(name).or_insert(id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.productions.is_empty() && self.parameters.is_empty()
    }

    /// Names of one kind, unordered.
    pub fn names(&self, kind: SymbolKind) -> impl Iterator<Item = (Name, SymbolId)> + '_ {
        self.map(kind).iter().map(|(&name, &id)| (name, id))
    }
}

/// Everything binding produces, across all bound files: parent edges,
/// symbols, declaration and reference sites. Maps are plain hash maps;
/// an unbound table holds no allocations.
#[derive(Debug, Default)]
pub struct BindingTable {
    file_ids: FxHashMap<String, FileId>,
    filenames: Vec<String>,
    symbols: Vec<Symbol>,
    globals: SymbolTable,
    parents: FxHashMap<NodeKey, NodeKey>,
    node_symbols: FxHashMap<NodeKey, SymbolId>,
    declarations: FxHashMap<SymbolId, Vec<NodeKey>>,
    references: FxHashMap<SymbolId, Vec<NodeKey>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self, filename: &str) -> bool {
        self.file_ids.contains_key(filename)
    }

    pub fn file_id(&self, filename: &str) -> Option<FileId> {
        self.file_ids.get(filename).copied()
    }

    pub fn filename(&self, file: FileId) -> &str {
        &self.filenames[file.0 as usize]
    }

    pub(crate) fn next_file_id(&self) -> FileId {
        FileId(self.filenames.len() as u32)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn symbol_base(&self) -> u32 {
        self.symbols.len() as u32
    }

    pub fn globals(&self) -> &SymbolTable {
        &self.globals
    }

    /// The syntactic parent of a bound node, if any. The file root has
    /// no parent.
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.parents.get(&key).copied()
    }

    /// The symbol a node declares or, once the checker has resolved it,
    /// refers to.
    pub fn symbol_of(&self, key: NodeKey) -> Option<SymbolId> {
        self.node_symbols.get(&key).copied()
    }

    pub fn declarations(&self, id: SymbolId) -> &[NodeKey] {
        self.declarations.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn references(&self, id: SymbolId) -> &[NodeKey] {
        self.references.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn resolve_global(&self, kind: SymbolKind, name: Name) -> Option<SymbolId> {
        self.globals.get(kind, name)
    }

    /// Look a name up in a symbol's local scope.
    pub fn resolve_local(&self, scope: SymbolId, kind: SymbolKind, name: Name) -> Option<SymbolId> {
        self.symbol(scope).locals().get(kind, name)
    }

    /// Record that `key` refers to `id`. Used by the checker as it
    /// resolves identifiers.
    pub fn record_reference(&mut self, id: SymbolId, key: NodeKey) {
        self.node_symbols.insert(key, id);
        let sites = self.references.entry(id).or_default();
        if !sites.contains(&key) {
            sites.push(key);
        }
    }

    pub(crate) fn commit(&mut self, filename: &str, scratch: super::binder::Scratch) {
        let file_id = self.next_file_id();
        self.file_ids.insert(filename.to_string(), file_id);
        self.filenames.push(filename.to_string());

        self.symbols.extend(scratch.symbols);
        self.globals.copy_from(&scratch.globals);
        for ((scope, kind, name), id) in scratch.locals {
            self.symbols[scope.0 as usize]
                .locals_mut()
                .insert(kind, name, id);
        }
        self.parents.extend(scratch.parents);
        self.node_symbols.extend(scratch.node_symbols);
        for (symbol, key) in scratch.declarations {
            self.declarations.entry(symbol).or_default().push(key);
        }
    }
}
