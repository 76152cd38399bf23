//! # Block parsing
//!
//! Two-phase block parsing:
//!
//! 1. **Line classification** (`classify`): each line yields local facts —
//!    indentation, blockquote depth, fence detection, list markers,
//!    container tags, table shape.
//! 2. **Block assembly** (`builder`): a recursive assembler consumes
//!    classified lines, stripping container prefixes and recursing so
//!    nesting depth is unbounded.
//!
//! Invariants:
//! - Fenced code interiors are raw zones: no block or container parsing
//!   inside.
//! - An open container tag without a matching close degrades to paragraph
//!   text, never an error.
//! - Leaf content stays raw text here; inline scanning happens per block in
//!   the tree builder, so block parses are independent and restartable.

pub mod builder;
pub mod classify;
pub mod types;

pub use builder::parse_blocks;
pub use types::{BlockIr, ListItemIr, TableRowIr};
