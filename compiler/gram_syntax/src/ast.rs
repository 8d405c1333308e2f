//! The flat, arena-allocated syntax tree.
//!
//! Nodes are immutable once created. The `update_*` methods are the
//! persistence surface: they return the same id when nothing changed and
//! otherwise allocate a new node sharing every unchanged child.
//!
//! # Reflection
//!
//! [`Node::edge_count`], [`Node::edge_name`], and [`Node::edge`] expose
//! each node's children as an ordered list of named slots (a child, a
//! child list, or absent). Generic traversal — the navigator, the
//! binder's walk, invariant checks — is built entirely on this surface.

use gram_diagnostic::Span;

use crate::{Name, SyntaxKind};

/// Index of a node within its file's [`SyntaxArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Range into the arena's child-list pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(C)]
pub struct NodeList {
    pub start: u32,
    pub len: u16,
}

impl NodeList {
    pub const EMPTY: NodeList = NodeList { start: 0, len: 0 };

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl std::fmt::Debug for NodeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NodeList({}..{})",
            self.start,
            self.start + u32::from(self.len)
        )
    }
}

/// The value of one reflection edge.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Edge {
    /// The slot is empty for this node instance.
    Empty,
    /// A single child.
    Node(NodeId),
    /// An ordered child list.
    List(NodeList),
}

impl Edge {
    fn of(child: Option<NodeId>) -> Edge {
        match child {
            Some(id) => Edge::Node(id),
            None => Edge::Empty,
        }
    }
}

/// The tagged union of every node shape.
///
/// Children are `NodeId`s into the same arena; leaf payloads are interned
/// names or literal values. Suffix `?` on symbols and the production's
/// colon kind are stored as data, not child nodes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    // Leaves
    Identifier { name: Name },
    StringLiteral { value: Name },
    NumberLiteral { value: u32 },
    TerminalLiteral { text: Name },
    UnicodeCharacterLiteral { text: Name },
    /// One prose fragment; `fragment` is a `Prose*` token kind.
    ProseFragment { fragment: SyntaxKind, text: Name },
    PlaceholderSymbol,
    InvalidSymbol,
    InvalidAssertion,
    LinkReference { text: Name },
    /// A bare keyword in value position (`true`/`false`/`default`).
    KeywordValue { keyword: SyntaxKind },

    // Symbols
    Terminal { literal: NodeId, question: bool },
    Nonterminal { name: NodeId, arguments: Option<NodeId>, question: bool },
    UnicodeCharacterRange { left: NodeId, right: NodeId },
    ButNotSymbol { left: Option<NodeId>, right: Option<NodeId> },
    OneOfSymbol { symbols: NodeList },
    Prose { fragments: NodeList },
    SymbolSpan { elements: NodeList },
    SymbolSet { elements: NodeList },

    // Assertions
    EmptyAssertion,
    LookaheadAssertion { operator: SyntaxKind, operand: Option<NodeId> },
    NoSymbolHereAssertion { symbols: NodeList },
    LexicalGoalAssertion { symbol: Option<NodeId> },

    // Productions
    Parameter { name: NodeId },
    ParameterList { elements: NodeList },
    Argument { operator: Option<SyntaxKind>, name: Option<NodeId> },
    ArgumentList { elements: NodeList },
    Constraints { elements: NodeList },
    RightHandSide {
        constraints: Option<NodeId>,
        head: Option<NodeId>,
        reference: Option<NodeId>,
    },
    RightHandSideList { elements: NodeList },
    OneOfList { terminals: NodeList },
    Production {
        name: NodeId,
        parameters: Option<NodeId>,
        colon: SyntaxKind,
        body: Option<NodeId>,
    },

    // Meta elements
    Import { path: Option<NodeId> },
    Define { key: Option<NodeId>, value: Option<NodeId> },
    Line { number: Option<NodeId>, path: Option<NodeId> },

    // Root
    SourceFile { elements: NodeList },
}

/// One node: shape plus source range.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }

    /// The syntax kind tag for this node.
    pub fn syntax_kind(&self) -> SyntaxKind {
        match &self.kind {
            NodeKind::Identifier { .. } => SyntaxKind::Identifier,
            NodeKind::StringLiteral { .. } => SyntaxKind::StringLiteral,
            NodeKind::NumberLiteral { .. } => SyntaxKind::NumberLiteral,
            NodeKind::TerminalLiteral { .. } => SyntaxKind::TerminalLiteral,
            NodeKind::UnicodeCharacterLiteral { .. } => SyntaxKind::UnicodeCharacterLiteral,
            NodeKind::ProseFragment { fragment, .. } => *fragment,
            NodeKind::PlaceholderSymbol => SyntaxKind::PlaceholderSymbol,
            NodeKind::InvalidSymbol => SyntaxKind::InvalidSymbol,
            NodeKind::InvalidAssertion => SyntaxKind::InvalidAssertion,
            NodeKind::LinkReference { .. } => SyntaxKind::LinkReference,
            NodeKind::KeywordValue { keyword } => *keyword,
            NodeKind::Terminal { .. } => SyntaxKind::Terminal,
            NodeKind::Nonterminal { .. } => SyntaxKind::Nonterminal,
            NodeKind::UnicodeCharacterRange { .. } => SyntaxKind::UnicodeCharacterRange,
            NodeKind::ButNotSymbol { .. } => SyntaxKind::ButNotSymbol,
            NodeKind::OneOfSymbol { .. } => SyntaxKind::OneOfSymbol,
            NodeKind::Prose { .. } => SyntaxKind::Prose,
            NodeKind::SymbolSpan { .. } => SyntaxKind::SymbolSpan,
            NodeKind::SymbolSet { .. } => SyntaxKind::SymbolSet,
            NodeKind::EmptyAssertion => SyntaxKind::EmptyAssertion,
            NodeKind::LookaheadAssertion { .. } => SyntaxKind::LookaheadAssertion,
            NodeKind::NoSymbolHereAssertion { .. } => SyntaxKind::NoSymbolHereAssertion,
            NodeKind::LexicalGoalAssertion { .. } => SyntaxKind::LexicalGoalAssertion,
            NodeKind::Parameter { .. } => SyntaxKind::Parameter,
            NodeKind::ParameterList { .. } => SyntaxKind::ParameterList,
            NodeKind::Argument { .. } => SyntaxKind::Argument,
            NodeKind::ArgumentList { .. } => SyntaxKind::ArgumentList,
            NodeKind::Constraints { .. } => SyntaxKind::Constraints,
            NodeKind::RightHandSide { .. } => SyntaxKind::RightHandSide,
            NodeKind::RightHandSideList { .. } => SyntaxKind::RightHandSideList,
            NodeKind::OneOfList { .. } => SyntaxKind::OneOfList,
            NodeKind::Production { .. } => SyntaxKind::Production,
            NodeKind::Import { .. } => SyntaxKind::Import,
            NodeKind::Define { .. } => SyntaxKind::Define,
            NodeKind::Line { .. } => SyntaxKind::Line,
            NodeKind::SourceFile { .. } => SyntaxKind::SourceFile,
        }
    }

    /// Names of this node's edges, in lexical order.
    pub fn edge_names(&self) -> &'static [&'static str] {
        match &self.kind {
            NodeKind::Terminal { .. } => &["literal"],
            NodeKind::Nonterminal { .. } => &["name", "arguments"],
            NodeKind::UnicodeCharacterRange { .. } => &["left", "right"],
            NodeKind::ButNotSymbol { .. } => &["left", "right"],
            NodeKind::OneOfSymbol { .. } => &["symbols"],
            NodeKind::Prose { .. } => &["fragments"],
            NodeKind::SymbolSpan { .. } => &["elements"],
            NodeKind::SymbolSet { .. } => &["elements"],
            NodeKind::LookaheadAssertion { .. } => &["operand"],
            NodeKind::NoSymbolHereAssertion { .. } => &["symbols"],
            NodeKind::LexicalGoalAssertion { .. } => &["symbol"],
            NodeKind::Parameter { .. } => &["name"],
            NodeKind::ParameterList { .. } => &["elements"],
            NodeKind::Argument { .. } => &["name"],
            NodeKind::ArgumentList { .. } => &["elements"],
            NodeKind::Constraints { .. } => &["elements"],
            NodeKind::RightHandSide { .. } => &["constraints", "head", "reference"],
            NodeKind::RightHandSideList { .. } => &["elements"],
            NodeKind::OneOfList { .. } => &["terminals"],
            NodeKind::Production { .. } => &["name", "parameters", "body"],
            NodeKind::Import { .. } => &["path"],
            NodeKind::Define { .. } => &["key", "value"],
            NodeKind::Line { .. } => &["number", "path"],
            NodeKind::SourceFile { .. } => &["elements"],
            _ => &[],
        }
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_names().len()
    }

    #[inline]
    pub fn edge_name(&self, index: usize) -> Option<&'static str> {
        self.edge_names().get(index).copied()
    }

    /// The value of edge `index`, or `Edge::Empty` out of range.
    pub fn edge(&self, index: usize) -> Edge {
        match (&self.kind, index) {
            (NodeKind::Terminal { literal, .. }, 0) => Edge::Node(*literal),
            (NodeKind::Nonterminal { name, .. }, 0) => Edge::Node(*name),
            (NodeKind::Nonterminal { arguments, .. }, 1) => Edge::of(*arguments),
            (NodeKind::UnicodeCharacterRange { left, .. }, 0) => Edge::Node(*left),
            (NodeKind::UnicodeCharacterRange { right, .. }, 1) => Edge::Node(*right),
            (NodeKind::ButNotSymbol { left, .. }, 0) => Edge::of(*left),
            (NodeKind::ButNotSymbol { right, .. }, 1) => Edge::of(*right),
            (NodeKind::OneOfSymbol { symbols }, 0) => Edge::List(*symbols),
            (NodeKind::Prose { fragments }, 0) => Edge::List(*fragments),
            (NodeKind::SymbolSpan { elements }, 0) => Edge::List(*elements),
            (NodeKind::SymbolSet { elements }, 0) => Edge::List(*elements),
            (NodeKind::LookaheadAssertion { operand, .. }, 0) => Edge::of(*operand),
            (NodeKind::NoSymbolHereAssertion { symbols }, 0) => Edge::List(*symbols),
            (NodeKind::LexicalGoalAssertion { symbol }, 0) => Edge::of(*symbol),
            (NodeKind::Parameter { name }, 0) => Edge::Node(*name),
            (NodeKind::ParameterList { elements }, 0) => Edge::List(*elements),
            (NodeKind::Argument { name, .. }, 0) => Edge::of(*name),
            (NodeKind::ArgumentList { elements }, 0) => Edge::List(*elements),
            (NodeKind::Constraints { elements }, 0) => Edge::List(*elements),
            (NodeKind::RightHandSide { constraints, .. }, 0) => Edge::of(*constraints),
            (NodeKind::RightHandSide { head, .. }, 1) => Edge::of(*head),
            (NodeKind::RightHandSide { reference, .. }, 2) => Edge::of(*reference),
            (NodeKind::RightHandSideList { elements }, 0) => Edge::List(*elements),
            (NodeKind::OneOfList { terminals }, 0) => Edge::List(*terminals),
            (NodeKind::Production { name, .. }, 0) => Edge::Node(*name),
            (NodeKind::Production { parameters, .. }, 1) => Edge::of(*parameters),
            (NodeKind::Production { body, .. }, 2) => Edge::of(*body),
            (NodeKind::Import { path }, 0) => Edge::of(*path),
            (NodeKind::Define { key, .. }, 0) => Edge::of(*key),
            (NodeKind::Define { value, .. }, 1) => Edge::of(*value),
            (NodeKind::Line { number, .. }, 0) => Edge::of(*number),
            (NodeKind::Line { path, .. }, 1) => Edge::of(*path),
            (NodeKind::SourceFile { elements }, 0) => Edge::List(*elements),
            _ => Edge::Empty,
        }
    }
}

/// Arena watermark for speculative-parse rollback.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ArenaCheckpoint {
    nodes: usize,
    lists: usize,
}

/// Storage for one file's nodes and child lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyntaxArena {
    nodes: Vec<Node>,
    lists: Vec<NodeId>,
}

impl SyntaxArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a node.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, span));
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.node(id).syntax_kind()
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// Watermark for [`truncate`](Self::truncate).
    pub fn checkpoint(&self) -> ArenaCheckpoint {
        ArenaCheckpoint {
            nodes: self.nodes.len(),
            lists: self.lists.len(),
        }
    }

    /// Discard every node and list added since `checkpoint` was taken.
    ///
    /// Sound only while no id handed out after the checkpoint is still
    /// held, which is the case for rolled-back speculative parses.
    pub fn truncate(&mut self, checkpoint: ArenaCheckpoint) {
        self.nodes.truncate(checkpoint.nodes);
        self.lists.truncate(checkpoint.lists);
    }

    /// Pool a child list.
    pub fn add_list(&mut self, children: &[NodeId]) -> NodeList {
        assert!(children.len() <= u16::MAX as usize, "child list too long");
        if children.is_empty() {
            return NodeList::EMPTY;
        }
        let start = self.lists.len() as u32;
        self.lists.extend_from_slice(children);
        NodeList {
            start,
            len: children.len() as u16,
        }
    }

    #[inline]
    pub fn list(&self, list: NodeList) -> &[NodeId] {
        &self.lists[list.start as usize..list.start as usize + list.len()]
    }

    /// All direct children of a node, via reflection edges, in order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        let mut out = Vec::new();
        for index in 0..node.edge_count() {
            match node.edge(index) {
                Edge::Empty => {}
                Edge::Node(child) => out.push(child),
                Edge::List(list) => out.extend_from_slice(self.list(list)),
            }
        }
        out
    }

    /// Visit every node in the subtree rooted at `id`, parents first.
    pub fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId)) {
        f(id);
        for child in self.children(id) {
            self.walk(child, f);
        }
    }

    /// Persistent update for a right-hand side.
    ///
    /// Returns the same id when every part is unchanged, otherwise a new
    /// node (with the old node's span) sharing the unchanged children. A
    /// change to any single part — including the constraints alone —
    /// produces a new node.
    pub fn update_right_hand_side(
        &mut self,
        id: NodeId,
        constraints: Option<NodeId>,
        head: Option<NodeId>,
        reference: Option<NodeId>,
    ) -> NodeId {
        let span = self.span(id);
        match &self.node(id).kind {
            NodeKind::RightHandSide {
                constraints: old_constraints,
                head: old_head,
                reference: old_reference,
            } => {
                if *old_constraints == constraints
                    && *old_head == head
                    && *old_reference == reference
                {
                    return id;
                }
            }
            _ => return id,
        }
        self.add(
            NodeKind::RightHandSide {
                constraints,
                head,
                reference,
            },
            span,
        )
    }

    /// Persistent update for a production.
    pub fn update_production(
        &mut self,
        id: NodeId,
        name: NodeId,
        parameters: Option<NodeId>,
        body: Option<NodeId>,
    ) -> NodeId {
        let span = self.span(id);
        let colon = match &self.node(id).kind {
            NodeKind::Production {
                name: old_name,
                parameters: old_parameters,
                colon,
                body: old_body,
            } => {
                if *old_name == name && *old_parameters == parameters && *old_body == body {
                    return id;
                }
                *colon
            }
            _ => return id,
        };
        self.add(
            NodeKind::Production {
                name,
                parameters,
                colon,
                body,
            },
            span,
        )
    }
}
