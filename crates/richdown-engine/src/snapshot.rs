//! Normalized, serializable views of a document for inspection and tests,
//! plus structural invariant checks.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dom::{Document, NodeId, NodeKind};
use crate::parsing::tags;

/// A serializable snapshot of a whole document.
#[derive(Debug, Serialize)]
pub struct DocSnapshot {
    pub blocks: Vec<NodeSnapshot>,
}

/// One node, flattened to strings for stable output.
#[derive(Debug, Serialize)]
pub struct NodeSnapshot {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

pub fn snapshot(doc: &Document) -> DocSnapshot {
    DocSnapshot {
        blocks: doc
            .children(doc.root())
            .iter()
            .map(|&c| node_snapshot(doc, c))
            .collect(),
    }
}

fn node_snapshot(doc: &Document, id: NodeId) -> NodeSnapshot {
    let mut attrs = BTreeMap::new();
    let mut text = None;
    let kind = match doc.kind(id) {
        NodeKind::Root => "root".to_string(),
        NodeKind::Paragraph => "paragraph".to_string(),
        NodeKind::Heading { level } => {
            attrs.insert("level".into(), level.to_string());
            "heading".to_string()
        }
        NodeKind::BulletedList { tight } => {
            attrs.insert("tight".into(), tight.to_string());
            "bulleted_list".to_string()
        }
        NodeKind::OrderedList { start, tight } => {
            attrs.insert("start".into(), start.to_string());
            attrs.insert("tight".into(), tight.to_string());
            "ordered_list".to_string()
        }
        NodeKind::ListItem { index } => {
            if let Some(i) = index {
                attrs.insert("index".into(), i.to_string());
            }
            "list_item".to_string()
        }
        NodeKind::Blockquote => "blockquote".to_string(),
        NodeKind::FencedCode { language, literal } => {
            if let Some(l) = language {
                attrs.insert("language".into(), l.clone());
            }
            text = Some(literal.clone());
            "fenced_code".to_string()
        }
        NodeKind::QuoteBlock { attribution } => {
            if let Some(a) = attribution {
                attrs.insert("attribution".into(), tags::attribution_to_string(a));
            }
            "quote_block".to_string()
        }
        NodeKind::WrapBlock { name, attributes } => {
            if let Some(n) = name {
                attrs.insert("name".into(), n.clone());
            }
            attrs.extend(attributes.clone());
            "wrap_block".to_string()
        }
        NodeKind::Table { columns } => {
            attrs.insert("columns".into(), columns.to_string());
            "table".to_string()
        }
        NodeKind::TableRow { header } => {
            attrs.insert("header".into(), header.to_string());
            "table_row".to_string()
        }
        NodeKind::TableCell => "table_cell".to_string(),
        NodeKind::ThematicBreak => "thematic_break".to_string(),
        NodeKind::ImageGrid => "image_grid".to_string(),
        NodeKind::Text { text: t } => {
            text = Some(t.clone());
            "text".to_string()
        }
        NodeKind::Emoji { shortcode } => {
            attrs.insert("shortcode".into(), shortcode.clone());
            "emoji".to_string()
        }
        NodeKind::Mention { username, resolved } => {
            attrs.insert("username".into(), username.clone());
            attrs.insert("resolved".into(), resolved.to_string());
            "mention".to_string()
        }
        NodeKind::Hashtag { slug, kind } => {
            attrs.insert("slug".into(), slug.clone());
            attrs.insert("resolved".into(), kind.is_some().to_string());
            if let Some(k) = kind {
                attrs.insert("kind".into(), format!("{k:?}").to_lowercase());
            }
            "hashtag".to_string()
        }
        NodeKind::Image {
            src,
            alt,
            title,
            scale,
            width,
            height,
            resolved_src,
        } => {
            attrs.insert("src".into(), src.clone());
            attrs.insert("alt".into(), alt.clone());
            if let Some(t) = title {
                attrs.insert("title".into(), t.clone());
            }
            if let Some(s) = scale {
                attrs.insert("scale".into(), s.to_string());
            }
            if let Some(w) = width {
                attrs.insert("width".into(), w.to_string());
            }
            if let Some(h) = height {
                attrs.insert("height".into(), h.to_string());
            }
            if let Some(r) = resolved_src {
                attrs.insert("resolved_src".into(), r.clone());
            }
            "image".to_string()
        }
        NodeKind::Autolink { url } => {
            attrs.insert("url".into(), url.clone());
            "autolink".to_string()
        }
        NodeKind::InlineOnebox { url, title } => {
            attrs.insert("url".into(), url.clone());
            attrs.insert("title".into(), title.clone());
            "inline_onebox".to_string()
        }
        NodeKind::InlineWrap { name, attributes } => {
            if let Some(n) = name {
                attrs.insert("name".into(), n.clone());
            }
            attrs.extend(attributes.clone());
            "inline_wrap".to_string()
        }
        NodeKind::HardBreak => "hard_break".to_string(),
    };

    let marks = {
        let m = doc.marks(id);
        let mut out = Vec::new();
        if m.bold {
            out.push("bold".to_string());
        }
        if m.italic {
            out.push("italic".to_string());
        }
        if m.code {
            out.push("code".to_string());
        }
        if m.strikethrough {
            out.push("strikethrough".to_string());
        }
        if let Some(l) = &m.link {
            out.push(if l.auto {
                format!("autolink({})", l.href)
            } else {
                format!("link({})", l.href)
            });
        }
        out
    };

    NodeSnapshot {
        kind,
        text,
        marks,
        attrs,
        children: doc
            .children(id)
            .iter()
            .map(|&c| node_snapshot(doc, c))
            .collect(),
    }
}

/// Assert the structural invariants of a document tree. Panics with a
/// description on violation; used by tests after parse and edit passes.
pub fn check_invariants(doc: &Document) {
    for n in doc.descendants(doc.root()) {
        let node = doc.node(n);
        for &c in &node.children {
            assert_eq!(
                doc.parent(c),
                Some(n),
                "child {c:?} of {n:?} has wrong parent link"
            );
        }
        // Code excludes every other mark.
        if node.marks.code {
            assert!(
                !node.marks.bold
                    && !node.marks.italic
                    && !node.marks.strikethrough
                    && node.marks.link.is_none(),
                "code run {n:?} carries extra marks"
            );
        }
        match &node.kind {
            NodeKind::Table { columns } => {
                for &row in &node.children {
                    assert_eq!(
                        doc.children(row).len(),
                        *columns,
                        "table row {row:?} not rectangularized"
                    );
                }
            }
            NodeKind::ImageGrid => {
                assert!(
                    !node.children.is_empty(),
                    "grid {n:?} wraps no images"
                );
                for &c in &node.children {
                    assert!(
                        matches!(doc.kind(c), NodeKind::Image { .. }),
                        "grid child {c:?} is not an image"
                    );
                }
                let mut cur = node.parent;
                while let Some(p) = cur {
                    assert!(
                        !matches!(doc.kind(p), NodeKind::ImageGrid),
                        "grid {n:?} nested inside grid {p:?}"
                    );
                    cur = doc.parent(p);
                }
            }
            kind if kind.is_inline_container() => {
                for &c in &node.children {
                    assert!(
                        doc.kind(c).is_inline(),
                        "inline container {n:?} holds block child {c:?}"
                    );
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;

    #[test]
    fn snapshot_shape_for_simple_doc() {
        let doc = parse("# Hi\n\n**bold** text");
        let snap = snapshot(&doc);
        assert_eq!(snap.blocks.len(), 2);
        assert_eq!(snap.blocks[0].kind, "heading");
        assert_eq!(snap.blocks[0].attrs.get("level").map(String::as_str), Some("1"));
        assert_eq!(snap.blocks[1].children[0].marks, vec!["bold".to_string()]);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let doc = parse("- a\n- b");
        let json = serde_json::to_string(&snapshot(&doc)).unwrap();
        assert!(json.contains("bulleted_list"));
        assert!(json.contains("list_item"));
    }

    #[test]
    fn invariants_hold_for_parsed_documents() {
        let corpus = [
            "# h\n\npara",
            "| a | b |\n|---|---|\n| 1 | 2 | 3 |",
            "[grid]\n![a](x.png)\n[/grid]",
            "> quote\n\n- list\n  - nested",
            "`code` and **marks**",
        ];
        for src in corpus {
            check_invariants(&parse(src));
        }
    }
}
