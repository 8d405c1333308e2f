//! Syntax tree and token types for the Gram compiler.
//!
//! The tree is a flat, arena-allocated tagged union: nodes are addressed
//! by [`NodeId`], child lists are ranges into a shared pool, and no node
//! carries a parent pointer. Every node exposes a uniform reflection
//! surface — an ordered list of named edges — which is what lets the
//! navigator and generic visitors traverse any node kind without
//! per-kind branching.

mod ast;
mod interner;
mod source_file;
mod syntax_kind;
mod token;
mod trivia;

pub use ast::{ArenaCheckpoint, Edge, Node, NodeId, NodeKind, NodeList, SyntaxArena};
pub use interner::{Name, StringInterner};
pub use source_file::{SourceFile, TriviaTable};
pub use syntax_kind::SyntaxKind;
pub use token::{Token, TokenFlags};
pub use trivia::{Trivia, TriviaId, TriviaKind};

// The position substrate is used throughout; re-export the common types.
pub use gram_diagnostic::{LineMap, Position, Range, Span};
