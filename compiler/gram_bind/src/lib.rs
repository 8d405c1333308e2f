//! Name binding for the Gram grammar language.
//!
//! Binding is a per-file pass producing cross-file state: a parent map
//! over nodes, one symbol per unique (scope, kind, name), and the
//! declaration sites of each symbol. Reference sites are added later by
//! the checker as it resolves identifiers.

mod binder;
mod table;

#[cfg(test)]
mod tests;

pub use binder::bind_source_file;
pub use table::{BindingTable, FileId, NodeKey, Symbol, SymbolId, SymbolKind, SymbolTable};
