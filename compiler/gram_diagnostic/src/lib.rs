//! Diagnostics and position mapping for the Gram compiler.
//!
//! This crate is the substrate shared by every front-end component:
//!
//! - Source positions: [`Span`], [`Position`], [`Range`], [`LineMap`]
//! - The message catalog: code → template table with duplicate rejection
//! - The [`Diagnostics`] sink: append-only collection with per-file
//!   markers, stable sorting, and adjacent-duplicate removal
//! - [`RegionMap`]: sparse "value holds from line N until superseded"
//!   index, shared by `@define` pragma scoping and `@line` remapping
//! - [`LineOffsetMap`]: `@line` remapping to a virtual file/line
//! - Cooperative cancellation: [`CancelToken`] / [`Canceled`]

mod cancel;
mod catalog;
mod diagnostics;
pub mod emitter;
mod line_map;
mod line_offset_map;
mod region_map;
mod span;

pub use cancel::{CancelToken, Canceled};
pub use catalog::{catalog, CatalogError, Message, MessageCatalog, Severity};
pub use diagnostics::{codes, Diagnostic, Diagnostics, FormattedDiagnostic};
pub use line_map::LineMap;
pub use line_offset_map::{LineOffset, LineOffsetMap};
pub use region_map::{Region, RegionMap};
pub use span::{Position, Range, Span, SpanError};
