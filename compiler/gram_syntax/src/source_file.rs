//! The parsed representation of one grammar file.

use gram_diagnostic::{Diagnostics, LineMap};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{NodeId, SyntaxArena, Trivia, TriviaId};

type TriviaSet = SmallVec<[TriviaId; 2]>;

/// Trivia attachments for one file.
///
/// Each piece of trivia lives in the pool exactly once and appears in at
/// most one attachment set. Detached trivia (separated from any node by a
/// blank line, or past the last node) keeps pool order.
#[derive(Debug, Default)]
pub struct TriviaTable {
    pool: Vec<Trivia>,
    leading: FxHashMap<NodeId, TriviaSet>,
    trailing: FxHashMap<NodeId, TriviaSet>,
    detached: Vec<TriviaId>,
}

impl TriviaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a piece of trivia to the pool, initially unattached.
    pub fn add(&mut self, trivia: Trivia) -> TriviaId {
        let id = TriviaId(self.pool.len() as u32);
        self.pool.push(trivia);
        id
    }

    #[inline]
    pub fn get(&self, id: TriviaId) -> &Trivia {
        &self.pool[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// All trivia in source order.
    pub fn iter(&self) -> impl Iterator<Item = (TriviaId, &Trivia)> {
        self.pool
            .iter()
            .enumerate()
            .map(|(index, trivia)| (TriviaId(index as u32), trivia))
    }

    pub fn attach_leading(&mut self, node: NodeId, id: TriviaId) {
        self.leading.entry(node).or_default().push(id);
    }

    pub fn attach_trailing(&mut self, node: NodeId, id: TriviaId) {
        self.trailing.entry(node).or_default().push(id);
    }

    pub fn attach_detached(&mut self, id: TriviaId) {
        self.detached.push(id);
    }

    /// Trivia attached before `node`, in source order.
    pub fn leading(&self, node: NodeId) -> &[TriviaId] {
        self.leading.get(&node).map_or(&[], |set| set.as_slice())
    }

    /// Trivia attached after `node` on the same line, in source order.
    pub fn trailing(&self, node: NodeId) -> &[TriviaId] {
        self.trailing.get(&node).map_or(&[], |set| set.as_slice())
    }

    /// Trivia attached to no node.
    pub fn detached(&self) -> &[TriviaId] {
        &self.detached
    }
}

/// One parsed grammar file: text, tree, and everything derived during
/// the parse.
#[derive(Debug)]
pub struct SourceFile {
    filename: String,
    text: String,
    line_map: LineMap,
    arena: SyntaxArena,
    root: NodeId,
    imports: Vec<String>,
    diagnostics: Diagnostics,
    trivia: TriviaTable,
}

impl SourceFile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filename: String,
        text: String,
        line_map: LineMap,
        arena: SyntaxArena,
        root: NodeId,
        imports: Vec<String>,
        diagnostics: Diagnostics,
        trivia: TriviaTable,
    ) -> Self {
        SourceFile {
            filename,
            text,
            line_map,
            arena,
            root,
            imports,
            diagnostics,
            trivia,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    pub fn arena(&self) -> &SyntaxArena {
        &self.arena
    }

    /// Mutable arena access, for persistent updates.
    pub fn arena_mut(&mut self) -> &mut SyntaxArena {
        &mut self.arena
    }

    /// The root `SourceFile` node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Paths named by `@import` pragmas, in order of appearance.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn trivia(&self) -> &TriviaTable {
        &self.trivia
    }

    /// Source text of a node.
    pub fn node_text(&self, node: NodeId) -> &str {
        let span = self.arena.span(node);
        &self.text[span.start as usize..span.end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TriviaKind;
    use gram_diagnostic::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn trivia_attachment_sets_are_disjoint_views() {
        let mut table = TriviaTable::new();
        let a = table.add(Trivia::new(
            TriviaKind::SingleLineComment,
            Span::new(0, 8),
            None,
        ));
        let b = table.add(Trivia::new(
            TriviaKind::SingleLineComment,
            Span::new(20, 28),
            None,
        ));
        let c = table.add(Trivia::new(
            TriviaKind::SingleLineComment,
            Span::new(40, 48),
            None,
        ));

        let node = NodeId(0);
        table.attach_leading(node, a);
        table.attach_trailing(node, b);
        table.attach_detached(c);

        assert_eq!(table.leading(node), &[a]);
        assert_eq!(table.trailing(node), &[b]);
        assert_eq!(table.detached(), &[c]);
        assert_eq!(table.leading(NodeId(1)), &[] as &[TriviaId]);
        assert_eq!(table.len(), 3);
    }
}
