//! # Inline scanning
//!
//! Two-phase inline parsing for one block's content:
//!
//! 1. **Scan** (`scanner`): a cursor walks the text and emits flat tokens.
//!    Code spans are tried first and form raw zones: nothing inside them is
//!    scanned further — no emphasis, no autolinks, no emoji, no typographic
//!    replacement. Constructs that fail to close restore the cursor and
//!    degrade to literal text.
//!
//! 2. **Resolve** (`emphasis`): delimiter runs are paired
//!    closest-opening-wins (the CommonMark emphasis algorithm) and the token
//!    stream is materialized into [`InlineIr`] runs carrying well-nested
//!    [`MarkSet`]s.
//!
//! Scanning is restartable: blocks are parsed independently, so rescanning
//! any block reproduces identical tokens regardless of prior scans.

pub mod autolink;
pub mod cursor;
pub mod emoji;
pub mod emphasis;
pub mod scanner;
pub mod typographic;

use std::collections::BTreeMap;

use crate::dom::MarkSet;
use crate::options::ParseOptions;

/// A resolved inline node, ready for insertion into the document arena.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineIr {
    pub kind: InlineKindIr,
    pub marks: MarkSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineKindIr {
    Text(String),
    Emoji(String),
    Mention(String),
    Hashtag(String),
    Image {
        src: String,
        alt: String,
        title: Option<String>,
        scale: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Autolink(String),
    InlineWrap {
        name: Option<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<InlineIr>,
    },
    HardBreak,
}

/// Parse one block's inline content into resolved runs.
pub fn parse_inlines(text: &str, opts: &ParseOptions) -> Vec<InlineIr> {
    let toks = scanner::scan(text, opts);
    emphasis::resolve(toks, &MarkSet::plain(), opts)
}
