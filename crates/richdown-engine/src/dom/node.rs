use std::collections::BTreeMap;

use serde::Serialize;

/// Attribution parsed from a `[quote="user, post:3, topic:17"]` open tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteAttribution {
    pub username: String,
    pub post_number: Option<u32>,
    pub topic_id: Option<u64>,
}

/// What a resolved hashtag turned out to reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HashtagKind {
    Category,
    Tag,
}

/// The payload of a document node.
///
/// Block and inline variants share one enum because the tree is a single
/// arena; `is_inline`/`is_block` partition them. Inline variants that are not
/// `Text` are atoms: they count as one character for selection offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,

    // Block nodes
    Paragraph,
    Heading {
        level: u8,
    },
    BulletedList {
        tight: bool,
    },
    OrderedList {
        start: u64,
        tight: bool,
    },
    /// `index` keeps the explicit source number of an ordered item, so
    /// `1. a` / `5. b` round-trips the `5`.
    ListItem {
        index: Option<u64>,
    },
    Blockquote,
    FencedCode {
        language: Option<String>,
        literal: String,
    },
    QuoteBlock {
        attribution: Option<QuoteAttribution>,
    },
    WrapBlock {
        name: Option<String>,
        attributes: BTreeMap<String, String>,
    },
    /// Column count is fixed at the max observed across rows; rows are
    /// right-padded to it, never truncated.
    Table {
        columns: usize,
    },
    TableRow {
        header: bool,
    },
    TableCell,
    ThematicBreak,
    /// Wraps image children rendered as a visual grid. Never nested inside
    /// another grid.
    ImageGrid,

    // Inline nodes
    Text {
        text: String,
    },
    Emoji {
        shortcode: String,
    },
    Mention {
        username: String,
        resolved: bool,
    },
    /// `kind` is `None` until a resolver classifies the slug.
    Hashtag {
        slug: String,
        kind: Option<HashtagKind>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
        /// Percent scale from the `![alt|640x480,75%]` syntax.
        scale: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
        /// Display URL from upload resolution. Never serialized; `src` keeps
        /// the opaque `upload://` reference for round-trip.
        resolved_src: Option<String>,
    },
    /// A `<url>` autolink. Distinct from a bare-URL text run carrying an
    /// auto link mark.
    Autolink {
        url: String,
    },
    InlineOnebox {
        url: String,
        title: String,
    },
    InlineWrap {
        name: Option<String>,
        attributes: BTreeMap<String, String>,
    },
    HardBreak,
}

impl NodeKind {
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text { .. }
                | NodeKind::Emoji { .. }
                | NodeKind::Mention { .. }
                | NodeKind::Hashtag { .. }
                | NodeKind::Image { .. }
                | NodeKind::Autolink { .. }
                | NodeKind::InlineOnebox { .. }
                | NodeKind::InlineWrap { .. }
                | NodeKind::HardBreak
        )
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline() && !matches!(self, NodeKind::Root)
    }

    /// Blocks whose children are inline flow rather than nested blocks.
    pub fn is_inline_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::TableCell
                | NodeKind::InlineWrap { .. }
        )
    }

    /// Blocks whose children are other blocks.
    pub fn is_block_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Root
                | NodeKind::Blockquote
                | NodeKind::QuoteBlock { .. }
                | NodeKind::WrapBlock { .. }
                | NodeKind::ListItem { .. }
        )
    }
}
