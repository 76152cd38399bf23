//! Post-edit reconciliation of a block's inline flow.
//!
//! Runs after every mutation that touches inline content and restores the
//! flow to canonical form:
//!
//! - code runs carry only the code mark (code excludes everything else);
//! - synthetic (auto) link marks are revalidated against the URL grammar
//!   and dropped when an edit broke the span — no stale autolinks;
//! - empty text runs are removed;
//! - adjacent runs with identical marks are merged into one.

use crate::dom::{Document, NodeId, NodeKind};
use crate::parsing::inline::autolink;

pub(crate) fn reconcile_block(doc: &mut Document, block: NodeId) {
    let children: Vec<NodeId> = doc.children(block).to_vec();

    for &c in &children {
        doc.marks_mut(c).sanitize();
        let stale_auto = match (doc.kind(c), &doc.marks(c).link) {
            (NodeKind::Text { text }, Some(link)) if link.auto => !autolink::is_bare_url(text),
            _ => false,
        };
        if stale_auto {
            doc.marks_mut(c).link = None;
        }
    }

    // Drop empties, merge identical neighbors.
    let mut prev: Option<NodeId> = None;
    for c in children {
        let empty = matches!(doc.kind(c), NodeKind::Text { text } if text.is_empty());
        if empty {
            doc.detach(c);
            continue;
        }
        if let Some(p) = prev {
            let mergeable = matches!(doc.kind(p), NodeKind::Text { .. })
                && matches!(doc.kind(c), NodeKind::Text { .. })
                && doc.marks(p) == doc.marks(c);
            if mergeable {
                let NodeKind::Text { text: tail } = doc.kind(c).clone() else {
                    unreachable!();
                };
                if let NodeKind::Text { text } = doc.kind_mut(p) {
                    text.push_str(&tail);
                }
                doc.detach(c);
                continue;
            }
        }
        prev = Some(c);
    }
}
