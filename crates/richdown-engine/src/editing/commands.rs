//! The edit command set and its application to the document tree.
//!
//! All mutations flow through [`Cmd`]; each application is atomic, returns
//! the changed block(s), and leaves the affected inline flow reconciled
//! (runs merged, stale auto links dropped, code exclusivity restored).
//!
//! Inline positions are character offsets into a block's inline flow; every
//! non-text inline node counts as one character.

use std::ops::Range;

use crate::dom::{Document, LinkMark, MarkKind, MarkSet, NodeId, NodeKind};
use crate::error::EditError;

use super::reconcile;

/// Commands applicable to a live document.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        block: NodeId,
        at: usize,
        text: String,
    },
    DeleteRange {
        block: NodeId,
        range: Range<usize>,
    },
    ToggleMark {
        block: NodeId,
        range: Range<usize>,
        mark: MarkKind,
    },
    /// Apply (`Some`) or clear (`None`) a link mark over a range. Separate
    /// from `ToggleMark` because links carry a target.
    SetLink {
        block: NodeId,
        range: Range<usize>,
        link: Option<LinkMark>,
    },
    SetAttribute {
        node: NodeId,
        key: String,
        value: String,
    },
    InsertNode {
        parent: NodeId,
        index: usize,
        kind: NodeKind,
    },
    RemoveNode {
        node: NodeId,
    },
}

pub(crate) fn apply_command(doc: &mut Document, cmd: &Cmd) -> Result<Vec<NodeId>, EditError> {
    match cmd {
        Cmd::InsertText { block, at, text } => {
            insert_text(doc, *block, *at, text)?;
            Ok(vec![*block])
        }
        Cmd::DeleteRange { block, range } => {
            delete_range(doc, *block, range.clone())?;
            Ok(vec![*block])
        }
        Cmd::ToggleMark { block, range, mark } => {
            toggle_mark(doc, *block, range.clone(), *mark)?;
            Ok(vec![*block])
        }
        Cmd::SetLink { block, range, link } => {
            set_link(doc, *block, range.clone(), link.clone())?;
            Ok(vec![*block])
        }
        Cmd::SetAttribute { node, key, value } => {
            set_attribute(doc, *node, key, value)?;
            Ok(vec![*node])
        }
        Cmd::InsertNode {
            parent,
            index,
            kind,
        } => {
            let id = insert_node(doc, *parent, *index, kind.clone())?;
            Ok(vec![*parent, id])
        }
        Cmd::RemoveNode { node } => {
            let parent = remove_node(doc, *node)?;
            Ok(vec![parent])
        }
    }
}

fn check_inline_block(doc: &Document, block: NodeId) -> Result<(), EditError> {
    let node = doc.get(block).ok_or(EditError::UnknownNode(block))?;
    if !doc.is_attached(block) {
        return Err(EditError::DetachedNode(block));
    }
    if !node.kind.is_inline_container() {
        return Err(EditError::NotInlineContainer(block));
    }
    Ok(())
}

fn check_range(doc: &Document, block: NodeId, range: &Range<usize>) -> Result<(), EditError> {
    let len = doc.inline_flow_len(block);
    if range.start > range.end || range.end > len {
        return Err(EditError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

fn char_to_byte(s: &str, ch: usize) -> usize {
    s.char_indices().nth(ch).map(|(i, _)| i).unwrap_or(s.len())
}

/// Split the block's inline flow at a character offset, returning the child
/// index such that everything before it is strictly before the offset.
/// Splits a text run in two when the offset falls inside one.
fn split_at(doc: &mut Document, block: NodeId, offset: usize) -> usize {
    let children: Vec<NodeId> = doc.children(block).to_vec();
    let mut acc = 0;
    for (idx, &c) in children.iter().enumerate() {
        if acc == offset {
            return idx;
        }
        let len = doc.inline_len(c);
        if offset < acc + len {
            if let NodeKind::Text { text } = doc.kind(c).clone() {
                let byte = char_to_byte(&text, offset - acc);
                let (head, tail) = text.split_at(byte);
                let tail = tail.to_string();
                *doc.kind_mut(c) = NodeKind::Text {
                    text: head.to_string(),
                };
                let marks = doc.marks(c).clone();
                let nb = doc.push_node(NodeKind::Text { text: tail }, marks);
                doc.insert_child(block, idx + 1, nb);
                return idx + 1;
            }
            // Atoms are length 1, so an offset can only land on their edges.
            return idx;
        }
        acc += len;
    }
    children.len()
}

fn insert_text(doc: &mut Document, block: NodeId, at: usize, text: &str) -> Result<(), EditError> {
    check_inline_block(doc, block)?;
    check_range(doc, block, &(at..at))?;
    if text.is_empty() {
        return Ok(());
    }

    // Strictly inside a text run: splice and inherit the run's marks,
    // link included.
    let children: Vec<NodeId> = doc.children(block).to_vec();
    let mut acc = 0;
    for &c in &children {
        let len = doc.inline_len(c);
        if at > acc && at < acc + len {
            if let NodeKind::Text { text: t } = doc.kind_mut(c) {
                let byte = char_to_byte(t, at - acc);
                t.insert_str(byte, text);
                reconcile::reconcile_block(doc, block);
                return Ok(());
            }
        }
        acc += len;
    }

    // On a boundary: marks come from the neighbors, but a link (or code)
    // mark never grows by adjacent typing — it is kept only when the
    // insertion is between two runs carrying the same mark.
    let idx = split_at(doc, block, at);
    let prev_marks = idx
        .checked_sub(1)
        .and_then(|i| doc.children(block).get(i).copied())
        .map(|n| doc.marks(n).clone());
    let next_marks = doc
        .children(block)
        .get(idx)
        .copied()
        .map(|n| doc.marks(n).clone());

    let mut marks = prev_marks
        .clone()
        .or_else(|| next_marks.clone())
        .unwrap_or_default();
    let links_match = match (&prev_marks, &next_marks) {
        (Some(p), Some(n)) => p.link.is_some() && p.link == n.link,
        _ => false,
    };
    if !links_match {
        marks.link = None;
    }
    let code_match = matches!(
        (&prev_marks, &next_marks),
        (Some(p), Some(n)) if p.code && n.code
    );
    if !code_match {
        marks.code = false;
    }
    marks.sanitize();

    let node = doc.push_node(
        NodeKind::Text {
            text: text.to_string(),
        },
        marks,
    );
    doc.insert_child(block, idx, node);
    reconcile::reconcile_block(doc, block);
    Ok(())
}

fn delete_range(doc: &mut Document, block: NodeId, range: Range<usize>) -> Result<(), EditError> {
    check_inline_block(doc, block)?;
    check_range(doc, block, &range)?;
    if range.is_empty() {
        return Ok(());
    }
    let i0 = split_at(doc, block, range.start);
    let i1 = split_at(doc, block, range.end);
    let doomed: Vec<NodeId> = doc.children(block)[i0..i1].to_vec();
    for c in doomed {
        doc.detach(c);
    }
    reconcile::reconcile_block(doc, block);
    Ok(())
}

fn toggle_mark(
    doc: &mut Document,
    block: NodeId,
    range: Range<usize>,
    mark: MarkKind,
) -> Result<(), EditError> {
    if mark == MarkKind::Link {
        return Err(EditError::LinkNeedsTarget);
    }
    check_inline_block(doc, block)?;
    check_range(doc, block, &range)?;
    if range.is_empty() {
        return Ok(());
    }
    let i0 = split_at(doc, block, range.start);
    let i1 = split_at(doc, block, range.end);
    let affected: Vec<NodeId> = doc.children(block)[i0..i1].to_vec();
    if affected.is_empty() {
        return Ok(());
    }
    let all_have = affected.iter().all(|&c| doc.marks(c).has(mark));
    for c in affected {
        if all_have {
            doc.marks_mut(c).remove(mark);
        } else {
            doc.marks_mut(c).add(mark);
        }
    }
    reconcile::reconcile_block(doc, block);
    Ok(())
}

fn set_link(
    doc: &mut Document,
    block: NodeId,
    range: Range<usize>,
    link: Option<LinkMark>,
) -> Result<(), EditError> {
    check_inline_block(doc, block)?;
    check_range(doc, block, &range)?;
    if range.is_empty() {
        return Ok(());
    }
    let i0 = split_at(doc, block, range.start);
    let i1 = split_at(doc, block, range.end);
    let affected: Vec<NodeId> = doc.children(block)[i0..i1].to_vec();
    for c in affected {
        let marks = doc.marks_mut(c);
        // Code runs take no link; code wins.
        if link.is_some() && marks.code {
            continue;
        }
        marks.link = link.clone();
    }
    reconcile::reconcile_block(doc, block);
    Ok(())
}

fn set_attribute(
    doc: &mut Document,
    node: NodeId,
    key: &str,
    value: &str,
) -> Result<(), EditError> {
    doc.get(node).ok_or(EditError::UnknownNode(node))?;
    let invalid = || EditError::InvalidAttributeValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let unsupported = || EditError::UnsupportedAttribute {
        key: key.to_string(),
    };
    match doc.kind_mut(node) {
        NodeKind::Heading { level } => {
            if key != "level" {
                return Err(unsupported());
            }
            let v: u8 = value.parse().map_err(|_| invalid())?;
            if !(1..=6).contains(&v) {
                return Err(invalid());
            }
            *level = v;
        }
        NodeKind::OrderedList { start, .. } => {
            if key != "start" {
                return Err(unsupported());
            }
            *start = value.parse().map_err(|_| invalid())?;
        }
        NodeKind::FencedCode { language, .. } => {
            if key != "language" {
                return Err(unsupported());
            }
            *language = (!value.is_empty()).then(|| value.to_string());
        }
        NodeKind::WrapBlock {
            name, attributes, ..
        }
        | NodeKind::InlineWrap {
            name, attributes, ..
        } => {
            if key == "name" {
                *name = (!value.is_empty()).then(|| value.to_string());
            } else {
                attributes.insert(key.to_string(), value.to_string());
            }
        }
        NodeKind::Image {
            src,
            alt,
            title,
            scale,
            width,
            height,
            ..
        } => match key {
            "src" => *src = value.to_string(),
            "alt" => *alt = value.to_string(),
            "title" => *title = (!value.is_empty()).then(|| value.to_string()),
            "scale" => {
                *scale = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                }
            }
            "width" => {
                *width = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                }
            }
            "height" => {
                *height = if value.is_empty() {
                    None
                } else {
                    Some(value.parse().map_err(|_| invalid())?)
                }
            }
            _ => return Err(unsupported()),
        },
        _ => return Err(unsupported()),
    }
    Ok(())
}

fn insert_node(
    doc: &mut Document,
    parent: NodeId,
    index: usize,
    kind: NodeKind,
) -> Result<NodeId, EditError> {
    doc.get(parent).ok_or(EditError::UnknownNode(parent))?;
    if !doc.is_attached(parent) {
        return Err(EditError::DetachedNode(parent));
    }

    // Grids never nest.
    if matches!(kind, NodeKind::ImageGrid) {
        let mut cur = Some(parent);
        while let Some(n) = cur {
            if matches!(doc.kind(n), NodeKind::ImageGrid) {
                return Err(EditError::NestedGrid);
            }
            cur = doc.parent(n);
        }
    }

    let parent_kind = doc.kind(parent).clone();
    let id = if kind.is_inline() {
        if parent_kind.is_inline_container()
            || (matches!(parent_kind, NodeKind::ImageGrid)
                && matches!(kind, NodeKind::Image { .. }))
        {
            let id = doc.push_node(kind, MarkSet::plain());
            doc.insert_child(parent, index, id);
            id
        } else if parent_kind.is_block_container() {
            // An inline node dropped at block level becomes a standalone
            // block: images moved out of a grid land in their own
            // paragraph at the depth the grid occupied.
            let para = doc.push_node(NodeKind::Paragraph, MarkSet::plain());
            let id = doc.push_node(kind, MarkSet::plain());
            doc.append_child(para, id);
            doc.insert_child(parent, index, para);
            id
        } else {
            return Err(EditError::InvalidPlacement);
        }
    } else {
        if !parent_kind.is_block_container() {
            return Err(EditError::InvalidPlacement);
        }
        let id = doc.push_node(kind, MarkSet::plain());
        doc.insert_child(parent, index, id);
        id
    };
    Ok(id)
}

/// Remove a node. Returns the parent the node was detached from. A grid
/// emptied of its last image goes with it (a grid wraps one or more
/// images).
fn remove_node(doc: &mut Document, node: NodeId) -> Result<NodeId, EditError> {
    doc.get(node).ok_or(EditError::UnknownNode(node))?;
    if node == doc.root() {
        return Err(EditError::RemoveRoot);
    }
    let Some(parent) = doc.parent(node) else {
        return Err(EditError::DetachedNode(node));
    };
    doc.detach(node);

    if matches!(doc.kind(parent), NodeKind::ImageGrid) && doc.children(parent).is_empty() {
        let grandparent = doc.parent(parent);
        doc.detach(parent);
        return Ok(grandparent.unwrap_or(parent));
    }
    if doc.kind(parent).is_inline_container() {
        reconcile::reconcile_block(doc, parent);
    }
    Ok(parent)
}
