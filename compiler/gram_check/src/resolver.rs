//! A lookup facade over one checked file.
//!
//! The resolver ties together the pieces a tool needs after checking:
//! `@line`-remapped positions, parent lookup without parent pointers,
//! navigator construction at an arbitrary node, and declaration and
//! reference lookup through the binding table.

use std::hash::{Hash, Hasher};

use gram_bind::{BindingTable, NodeKey, SymbolId};
use gram_diagnostic::{LineOffsetMap, Position, Range, Span};
use gram_nav::Navigator;
use gram_syntax::{NodeId, NodeKind, SourceFile};
use rustc_hash::FxHasher;

pub struct Resolver<'a> {
    file: &'a SourceFile,
    bindings: &'a BindingTable,
    line_offsets: &'a LineOffsetMap,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        file: &'a SourceFile,
        bindings: &'a BindingTable,
        line_offsets: &'a LineOffsetMap,
    ) -> Self {
        Resolver {
            file,
            bindings,
            line_offsets,
        }
    }

    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    // ─── Effective positions ───

    /// The filename a position reports as, after `@line` remapping.
    pub fn effective_filename_at(&self, position: Position) -> &str {
        self.line_offsets
            .effective_filename_at(self.file.filename(), position)
    }

    pub fn effective_position(&self, position: Position) -> Position {
        self.line_offsets
            .effective_position(self.file.filename(), position)
    }

    pub fn effective_range(&self, span: Span) -> Range {
        let range = self.file.line_map().range_of(span);
        self.line_offsets
            .effective_range(self.file.filename(), range)
    }

    /// Inverse of [`Resolver::effective_position`]: the raw position in
    /// this file that remaps to `effective`, if any pragma produces it.
    pub fn raw_position_from_effective(
        &self,
        effective_file: &str,
        effective: Position,
    ) -> Option<Position> {
        self.line_offsets
            .raw_position_from_effective(self.file.filename(), effective_file, effective)
    }

    // ─── Tree and symbol lookup ───

    /// The parent recorded for a node during binding.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let key = self.key(node)?;
        let parent = self.bindings.parent(key)?;
        Some(parent.node)
    }

    /// A navigator positioned at the node. Fails for nodes with an
    /// empty span, which no position lookup can land on.
    pub fn navigator_at(&self, node: NodeId) -> Option<Navigator<'a>> {
        let mut nav = Navigator::new(self.file);
        if node == self.file.root() {
            return Some(nav);
        }
        let span = self.file.arena().span(node);
        if !nav.move_to_position(span.start, false) {
            return None;
        }
        loop {
            if nav.node() == node {
                return Some(nav);
            }
            if !nav.move_to_parent() {
                return None;
            }
        }
    }

    /// The symbol a name node declares or references.
    pub fn symbol_at(&self, node: NodeId) -> Option<SymbolId> {
        self.bindings.symbol_of(self.key(node)?)
    }

    pub fn declarations_of(&self, node: NodeId) -> &'a [NodeKey] {
        match self.symbol_at(node) {
            Some(symbol) => self.bindings.declarations(symbol),
            None => &[],
        }
    }

    pub fn references_of(&self, node: NodeId) -> &'a [NodeKey] {
        match self.symbol_at(node) {
            Some(symbol) => self.bindings.references(symbol),
            None => &[],
        }
    }

    // ─── Link ids ───

    /// A stable anchor id for a right-hand side: the explicit `#link`
    /// reference when one exists, otherwise a content hash of the
    /// constraint and symbol text, stable across edits elsewhere in
    /// the file.
    pub fn link_id(&self, rhs: NodeId) -> Option<String> {
        let NodeKind::RightHandSide {
            constraints,
            head,
            reference,
        } = self.file.arena().node(rhs).kind
        else {
            return None;
        };
        if let Some(reference) = reference {
            let text = self.file.node_text(reference);
            return Some(text.trim_start_matches('#').to_owned());
        }
        let mut hasher = FxHasher::default();
        if let Some(constraints) = constraints {
            self.file.node_text(constraints).hash(&mut hasher);
        }
        if let Some(head) = head {
            self.file.node_text(head).hash(&mut hasher);
        }
        Some(format!("{:016x}", hasher.finish()))
    }

    fn key(&self, node: NodeId) -> Option<NodeKey> {
        let file_id = self.bindings.file_id(self.file.filename())?;
        Some(NodeKey::new(file_id, node))
    }
}
