//! Markdown → rich document parsing pipeline.
//!
//! Raw text splits into lines, the block layer assembles block IR, and the
//! tree builder runs the inline scanner per block and produces the arena
//! [`Document`](crate::dom::Document). Parsing is total: malformed input
//! degrades to plain text, never an error.

pub mod blocks;
pub mod inline;
pub mod tags;
pub mod tree;

use crate::dom::Document;
use crate::options::ParseOptions;

/// Parse Markdown with default options.
pub fn parse(text: &str) -> Document {
    parse_with_options(text, &ParseOptions::default())
}

/// Parse Markdown into a rich document. Pure and synchronous; safe to call
/// repeatedly (a full reparse rebuilds the document from scratch).
pub fn parse_with_options(text: &str, opts: &ParseOptions) -> Document {
    log::debug!("parsing {} bytes of markdown", text.len());
    let lines: Vec<&str> = text.lines().collect();
    let blocks = blocks::parse_blocks(&lines);
    tree::build_document(blocks, opts)
}
