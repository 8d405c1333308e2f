//! Tree navigation for parsed grammar files.
//!
//! A [`Navigator`] is a cheap cursor over one file's syntax tree, built
//! entirely on the tree's reflection edges. It supports node-level moves
//! (children, siblings, parent, position lookup) and token-level moves
//! backed by lazy re-scans of node spans.

mod navigator;
mod tokens;

#[cfg(test)]
mod tests;

pub use navigator::Navigator;
