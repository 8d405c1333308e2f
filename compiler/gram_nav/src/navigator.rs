//! The tree cursor.
//!
//! Nodes carry no parent pointers; the navigator keeps the path from the
//! root as a stack of frames, each recording which edge and list slot of
//! the parent it came through. Every `move_to_*` either succeeds and
//! returns `true`, or returns `false` with the cursor observably
//! unchanged.

use std::cell::RefCell;
use std::rc::Rc;

use gram_syntax::{Edge, NodeId, SourceFile, SyntaxKind, Token};
use rustc_hash::FxHashMap;

use crate::tokens::compute_tokens;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Frame {
    node: NodeId,
    /// Edge of the parent this node came through.
    edge_index: usize,
    /// Slot within that edge when it is a list.
    list_offset: usize,
}

pub struct Navigator<'a> {
    file: &'a SourceFile,
    /// Never empty; the bottom frame is the file root.
    stack: Vec<Frame>,
    /// Token cursor within the current node's span, if descended.
    token: Option<usize>,
    cache: RefCell<FxHashMap<NodeId, Rc<[Token]>>>,
}

impl<'a> Navigator<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Navigator {
            file,
            stack: vec![Frame {
                node: file.root(),
                edge_index: 0,
                list_offset: 0,
            }],
            token: None,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────

    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    pub fn node(&self) -> NodeId {
        self.stack[self.stack.len() - 1].node
    }

    pub fn kind(&self) -> SyntaxKind {
        self.file.arena().kind(self.node())
    }

    pub fn span(&self) -> gram_diagnostic::Span {
        self.file.arena().span(self.node())
    }

    /// Root depth is zero.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn parent_kind(&self) -> Option<SyntaxKind> {
        let len = self.stack.len();
        if len < 2 {
            return None;
        }
        Some(self.file.arena().kind(self.stack[len - 2].node))
    }

    /// The token under the token cursor, if one is selected.
    pub fn token(&self) -> Option<Token> {
        let index = self.token?;
        self.tokens(self.node()).get(index).copied()
    }

    // ─── Node moves ───────────────────────────────────────────────────

    pub fn move_to_root(&mut self) -> bool {
        self.stack.truncate(1);
        self.token = None;
        true
    }

    pub fn move_to_parent(&mut self) -> bool {
        if self.stack.len() < 2 {
            return false;
        }
        self.stack.pop();
        self.token = None;
        true
    }

    pub fn move_to_first_child(&mut self) -> bool {
        self.move_to_child_from(0, false)
    }

    pub fn move_to_last_child(&mut self) -> bool {
        let count = self.current_node().edge_count();
        self.move_to_child_from(count, true)
    }

    fn move_to_child_from(&mut self, from: usize, backward: bool) -> bool {
        let node = self.current_node();
        let count = node.edge_count();
        let indices: Vec<usize> = if backward {
            (0..from.min(count)).rev().collect()
        } else {
            (from..count).collect()
        };
        for index in indices {
            match node.edge(index) {
                Edge::Node(child) => {
                    self.push(child, index, 0);
                    return true;
                }
                Edge::List(list) if !list.is_empty() => {
                    let slot = if backward { list.len() - 1 } else { 0 };
                    let child = self.file.arena().list(list)[slot];
                    self.push(child, index, slot);
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Move to the child behind the edge called `name`; the first
    /// element when the edge holds a list.
    pub fn move_to_child_named(&mut self, name: &str) -> bool {
        let node = self.current_node();
        for (index, &edge_name) in node.edge_names().iter().enumerate() {
            if edge_name != name {
                continue;
            }
            match node.edge(index) {
                Edge::Node(child) => {
                    self.push(child, index, 0);
                    return true;
                }
                Edge::List(list) if !list.is_empty() => {
                    let child = self.file.arena().list(list)[0];
                    self.push(child, index, 0);
                    return true;
                }
                _ => return false,
            }
        }
        false
    }

    /// Next sibling, continuing across the parent's later edges.
    pub fn move_to_next_sibling(&mut self) -> bool {
        let len = self.stack.len();
        if len < 2 {
            return false;
        }
        let top = self.stack[len - 1];
        let parent = self.file.arena().node(self.stack[len - 2].node);

        if let Edge::List(list) = parent.edge(top.edge_index) {
            if top.list_offset + 1 < list.len() {
                let child = self.file.arena().list(list)[top.list_offset + 1];
                self.replace_top(child, top.edge_index, top.list_offset + 1);
                return true;
            }
        }
        for index in top.edge_index + 1..parent.edge_count() {
            match parent.edge(index) {
                Edge::Node(child) => {
                    self.replace_top(child, index, 0);
                    return true;
                }
                Edge::List(list) if !list.is_empty() => {
                    let child = self.file.arena().list(list)[0];
                    self.replace_top(child, index, 0);
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Previous sibling, continuing across the parent's earlier edges.
    pub fn move_to_previous_sibling(&mut self) -> bool {
        let len = self.stack.len();
        if len < 2 {
            return false;
        }
        let top = self.stack[len - 1];
        let parent = self.file.arena().node(self.stack[len - 2].node);

        if top.list_offset > 0 {
            if let Edge::List(list) = parent.edge(top.edge_index) {
                let child = self.file.arena().list(list)[top.list_offset - 1];
                self.replace_top(child, top.edge_index, top.list_offset - 1);
                return true;
            }
        }
        for index in (0..top.edge_index).rev() {
            match parent.edge(index) {
                Edge::Node(child) => {
                    self.replace_top(child, index, 0);
                    return true;
                }
                Edge::List(list) if !list.is_empty() => {
                    let slot = list.len() - 1;
                    let child = self.file.arena().list(list)[slot];
                    self.replace_top(child, index, slot);
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Move to the node containing `pos` — the innermost by default, or
    /// the shallowest non-root node when `outermost` is set.
    pub fn move_to_position(&mut self, pos: u32, outermost: bool) -> bool {
        let arena = self.file.arena();
        let mut frames = vec![Frame {
            node: self.file.root(),
            edge_index: 0,
            list_offset: 0,
        }];
        'descend: loop {
            let node = arena.node(frames[frames.len() - 1].node);
            for index in 0..node.edge_count() {
                match node.edge(index) {
                    Edge::Node(child) if arena.span(child).contains(pos) => {
                        frames.push(Frame {
                            node: child,
                            edge_index: index,
                            list_offset: 0,
                        });
                        if outermost {
                            break 'descend;
                        }
                        continue 'descend;
                    }
                    Edge::List(list) => {
                        for (slot, &child) in arena.list(list).iter().enumerate() {
                            if arena.span(child).contains(pos) {
                                frames.push(Frame {
                                    node: child,
                                    edge_index: index,
                                    list_offset: slot,
                                });
                                if outermost {
                                    break 'descend;
                                }
                                continue 'descend;
                            }
                        }
                    }
                    _ => {}
                }
            }
            break;
        }
        if frames.len() < 2 {
            return false;
        }
        self.stack = frames;
        self.token = None;
        true
    }

    /// Run a compound move speculatively; a `None` result restores the
    /// cursor to where it was.
    pub fn probe<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let stack = self.stack.clone();
        let token = self.token;
        let result = f(self);
        if result.is_none() {
            self.stack = stack;
            self.token = token;
        }
        result
    }

    // ─── Token moves ──────────────────────────────────────────────────

    pub fn move_to_first_token(&mut self) -> bool {
        if self.tokens(self.node()).is_empty() {
            return false;
        }
        self.token = Some(0);
        true
    }

    pub fn move_to_last_token(&mut self) -> bool {
        let count = self.tokens(self.node()).len();
        if count == 0 {
            return false;
        }
        self.token = Some(count - 1);
        true
    }

    pub fn move_to_next_token(&mut self) -> bool {
        match self.token {
            None => self.move_to_first_token(),
            Some(index) => {
                if index + 1 < self.tokens(self.node()).len() {
                    self.token = Some(index + 1);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn move_to_previous_token(&mut self) -> bool {
        match self.token {
            None => self.move_to_last_token(),
            Some(0) => false,
            Some(index) => {
                self.token = Some(index - 1);
                true
            }
        }
    }

    /// Select the token whose span contains `pos`, or whose right edge
    /// touches it.
    pub fn move_to_touching_token(&mut self, pos: u32) -> bool {
        let tokens = self.tokens(self.node());
        let index = tokens.partition_point(|token| token.pos() <= pos);
        let Some(candidate) = index.checked_sub(1) else {
            return false;
        };
        if pos > tokens[candidate].end() {
            return false;
        }
        self.token = Some(candidate);
        true
    }

    // ─── Internals ────────────────────────────────────────────────────

    fn current_node(&self) -> &gram_syntax::Node {
        self.file.arena().node(self.node())
    }

    fn push(&mut self, node: NodeId, edge_index: usize, list_offset: usize) {
        self.stack.push(Frame {
            node,
            edge_index,
            list_offset,
        });
        self.token = None;
    }

    fn replace_top(&mut self, node: NodeId, edge_index: usize, list_offset: usize) {
        let len = self.stack.len();
        self.stack[len - 1] = Frame {
            node,
            edge_index,
            list_offset,
        };
        self.token = None;
    }

    /// Token stream of a node's span, lazily re-scanned and cached.
    fn tokens(&self, node: NodeId) -> Rc<[Token]> {
        if let Some(cached) = self.cache.borrow().get(&node) {
            return Rc::clone(cached);
        }
        let computed = compute_tokens(self.file, node);
        self.cache
            .borrow_mut()
            .insert(node, Rc::clone(&computed));
        computed
    }
}

impl Clone for Navigator<'_> {
    /// A shallow copy of the cursor. The token cache is not shared; the
    /// clone re-scans on demand.
    fn clone(&self) -> Self {
        Navigator {
            file: self.file,
            stack: self.stack.clone(),
            token: self.token,
            cache: RefCell::new(FxHashMap::default()),
        }
    }
}
