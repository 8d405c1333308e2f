//! Scanner for the Gram grammar language.
//!
//! Turns source text into a token stream with trivia and indentation
//! classification. The scanner is modal: a `>` or `[>` token switches to
//! a prose sub-scanner until the prose construct ends. Speculation
//! (`speculate`, `scan_range`) snapshots and restores the full mutable
//! state, including buffered trivia and reported diagnostics.

mod cursor;
mod entities;
mod scanner;

pub use cursor::Cursor;
pub use entities::{decode_entity, DecodedEntity};
pub use scanner::{Scanner, ScannerSnapshot};
