//! Assembly of block and inline IR into the arena [`Document`], plus the
//! structural normalization passes: table rectangularization (depth-first,
//! each table independent) and image-grid extraction with the no-nesting
//! invariant.

use crate::dom::{Document, MarkSet, NodeId, NodeKind};
use crate::options::ParseOptions;

use super::blocks::{BlockIr, ListItemIr, TableRowIr};
use super::inline::{self, InlineIr, InlineKindIr};

/// Pure function: IR in, document out. No I/O, no external lookups —
/// mentions and hashtags are built unresolved and upgraded later by
/// resolution patches.
pub fn build_document(blocks: Vec<BlockIr>, opts: &ParseOptions) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    for block in blocks {
        append_block(&mut doc, root, block, opts);
    }
    doc
}

fn append_block(doc: &mut Document, parent: NodeId, block: BlockIr, opts: &ParseOptions) {
    match block {
        BlockIr::Paragraph { text } => {
            let id = doc.push_node(NodeKind::Paragraph, MarkSet::plain());
            attach_inlines(doc, id, inline::parse_inlines(&text, opts));
            doc.append_child(parent, id);
        }
        BlockIr::Heading { level, text } => {
            let id = doc.push_node(NodeKind::Heading { level }, MarkSet::plain());
            attach_inlines(doc, id, inline::parse_inlines(&text, opts));
            doc.append_child(parent, id);
        }
        BlockIr::BulletedList { tight, items } => {
            let id = doc.push_node(NodeKind::BulletedList { tight }, MarkSet::plain());
            attach_items(doc, id, items, opts);
            doc.append_child(parent, id);
        }
        BlockIr::OrderedList {
            start,
            tight,
            items,
        } => {
            let id = doc.push_node(NodeKind::OrderedList { start, tight }, MarkSet::plain());
            attach_items(doc, id, items, opts);
            doc.append_child(parent, id);
        }
        BlockIr::Blockquote { children } => {
            let id = doc.push_node(NodeKind::Blockquote, MarkSet::plain());
            for c in children {
                append_block(doc, id, c, opts);
            }
            doc.append_child(parent, id);
        }
        BlockIr::FencedCode { language, literal } => {
            let id = doc.push_node(NodeKind::FencedCode { language, literal }, MarkSet::plain());
            doc.append_child(parent, id);
        }
        BlockIr::QuoteBlock {
            attribution,
            children,
        } => {
            let id = doc.push_node(NodeKind::QuoteBlock { attribution }, MarkSet::plain());
            for c in children {
                append_block(doc, id, c, opts);
            }
            doc.append_child(parent, id);
        }
        BlockIr::WrapBlock {
            name,
            attributes,
            children,
        } => {
            let id = doc.push_node(NodeKind::WrapBlock { name, attributes }, MarkSet::plain());
            for c in children {
                append_block(doc, id, c, opts);
            }
            doc.append_child(parent, id);
        }
        BlockIr::Grid { children } => append_grid(doc, parent, children, opts),
        BlockIr::Table { rows } => {
            let id = build_table(doc, rows, opts);
            doc.append_child(parent, id);
        }
        BlockIr::ThematicBreak => {
            let id = doc.push_node(NodeKind::ThematicBreak, MarkSet::plain());
            doc.append_child(parent, id);
        }
    }
}

fn attach_items(doc: &mut Document, list: NodeId, items: Vec<ListItemIr>, opts: &ParseOptions) {
    for item in items {
        let id = doc.push_node(NodeKind::ListItem { index: item.index }, MarkSet::plain());
        for c in item.children {
            append_block(doc, id, c, opts);
        }
        doc.append_child(list, id);
    }
}

/// Rows are rectangularized on entry: the column count is the max across all
/// rows, short rows right-padded with empty cells, never truncated. Nested
/// tables were already built (and normalized) by their own recursion.
fn build_table(doc: &mut Document, rows: Vec<TableRowIr>, opts: &ParseOptions) -> NodeId {
    // A degenerate all-empty header still yields one column so the emitted
    // separator row stays a valid delimiter.
    let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(1).max(1);
    let table = doc.push_node(NodeKind::Table { columns }, MarkSet::plain());
    for row in rows {
        let row_id = doc.push_node(NodeKind::TableRow { header: row.header }, MarkSet::plain());
        for c in 0..columns {
            let cell = doc.push_node(NodeKind::TableCell, MarkSet::plain());
            if let Some(text) = row.cells.get(c) {
                attach_inlines(doc, cell, inline::parse_inlines(text, opts));
            }
            doc.append_child(row_id, cell);
        }
        doc.append_child(table, row_id);
    }
    table
}

/// A grid forms only when its interior is nothing but images (allowing
/// whitespace and nested grids, which dissolve into this one so grids never
/// nest). Anything else degrades: the interior blocks are spliced in place
/// of the grid and no content is lost.
fn append_grid(doc: &mut Document, parent: NodeId, children: Vec<BlockIr>, opts: &ParseOptions) {
    let grid = doc.push_node(NodeKind::ImageGrid, MarkSet::plain());
    for c in children {
        append_block(doc, grid, c, opts);
    }

    if !grid_content_is_images(doc, grid) {
        let kids: Vec<NodeId> = doc.children(grid).to_vec();
        for k in kids {
            doc.detach(k);
            doc.append_child(parent, k);
        }
        return;
    }

    let images: Vec<NodeId> = doc
        .descendants(grid)
        .into_iter()
        .filter(|&n| matches!(doc.kind(n), NodeKind::Image { .. }))
        .collect();
    if images.is_empty() {
        let kids: Vec<NodeId> = doc.children(grid).to_vec();
        for k in kids {
            doc.detach(k);
            doc.append_child(parent, k);
        }
        return;
    }

    let kids: Vec<NodeId> = doc.children(grid).to_vec();
    for k in kids {
        doc.detach(k);
    }
    for img in images {
        doc.detach(img);
        doc.append_child(grid, img);
    }
    doc.append_child(parent, grid);
}

fn grid_content_is_images(doc: &Document, grid: NodeId) -> bool {
    doc.children(grid).iter().all(|&c| match doc.kind(c) {
        NodeKind::Paragraph => doc.children(c).iter().all(|&i| match doc.kind(i) {
            NodeKind::Image { .. } => true,
            NodeKind::Text { text } => text.trim().is_empty(),
            _ => false,
        }),
        NodeKind::ImageGrid => true,
        _ => false,
    })
}

fn attach_inlines(doc: &mut Document, parent: NodeId, runs: Vec<InlineIr>) {
    for run in runs {
        let id = build_inline(doc, run);
        doc.append_child(parent, id);
    }
}

fn build_inline(doc: &mut Document, run: InlineIr) -> NodeId {
    let InlineIr { kind, marks } = run;
    match kind {
        InlineKindIr::Text(text) => doc.push_node(NodeKind::Text { text }, marks),
        InlineKindIr::Emoji(shortcode) => doc.push_node(NodeKind::Emoji { shortcode }, marks),
        InlineKindIr::Mention(username) => doc.push_node(
            NodeKind::Mention {
                username,
                resolved: false,
            },
            marks,
        ),
        InlineKindIr::Hashtag(slug) => {
            doc.push_node(NodeKind::Hashtag { slug, kind: None }, marks)
        }
        InlineKindIr::Image {
            src,
            alt,
            title,
            scale,
            width,
            height,
        } => doc.push_node(
            NodeKind::Image {
                src,
                alt,
                title,
                scale,
                width,
                height,
                resolved_src: None,
            },
            marks,
        ),
        InlineKindIr::Autolink(url) => doc.push_node(NodeKind::Autolink { url }, marks),
        InlineKindIr::InlineWrap {
            name,
            attributes,
            children,
        } => {
            let id = doc.push_node(NodeKind::InlineWrap { name, attributes }, marks);
            attach_inlines(doc, id, children);
            id
        }
        InlineKindIr::HardBreak => doc.push_node(NodeKind::HardBreak, marks),
    }
}
