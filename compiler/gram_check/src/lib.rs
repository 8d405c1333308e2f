//! Semantic analysis for parsed grammar files.
//!
//! [`Checker::check_source_file`] validates one file against the
//! binding table: pragma keys and values, structural symbol shapes,
//! strict parametric production consistency, and identifier
//! resolution. [`Resolver`] is the read-only facade tools use
//! afterwards for position remapping and symbol lookup.

mod checker;
mod resolver;

pub use checker::{Checker, CompilerOptions};
pub use resolver::Resolver;
