//! Recursive block assembly over classified lines.
//!
//! Containers (blockquotes, `[quote]`/`[wrap]`/`[grid]`, list items) strip
//! their prefix and recurse, so nesting depth is unbounded and every level
//! sees plain lines. Fenced code interiors are raw zones: container close
//! tags inside a fence do not close anything.

use super::classify::{self, Fence, LineTag};
use super::types::{BlockIr, ListItemIr, TableRowIr};
use crate::parsing::tags;

pub fn parse_blocks(lines: &[&str]) -> Vec<BlockIr> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if classify::is_blank(line) {
            i += 1;
            continue;
        }

        if let Some(tag) = classify::line_tag(line) {
            match tag {
                LineTag::QuoteOpen { attribution, rest } => {
                    if let Some(inner) = strip_trailing_close(&rest, tags::QUOTE_CLOSE) {
                        let interior: Vec<&str> =
                            if inner.is_empty() { vec![] } else { vec![inner] };
                        out.push(BlockIr::QuoteBlock {
                            attribution,
                            children: parse_blocks(&interior),
                        });
                        i += 1;
                        continue;
                    }
                    if let Some(j) = find_close(lines, i + 1, Container::Quote) {
                        let mut interior: Vec<&str> = Vec::new();
                        if !rest.is_empty() {
                            interior.push(rest.as_str());
                        }
                        interior.extend_from_slice(&lines[i + 1..j]);
                        out.push(BlockIr::QuoteBlock {
                            attribution,
                            children: parse_blocks(&interior),
                        });
                        i = j + 1;
                        continue;
                    }
                    // No close tag: the open tag line degrades to text.
                }
                LineTag::WrapOpen { tag, rest } => {
                    if let Some(inner) = strip_trailing_close(&rest, tags::WRAP_CLOSE) {
                        let interior: Vec<&str> =
                            if inner.is_empty() { vec![] } else { vec![inner] };
                        out.push(BlockIr::WrapBlock {
                            name: tag.name,
                            attributes: tag.attributes,
                            children: parse_blocks(&interior),
                        });
                        i += 1;
                        continue;
                    }
                    if let Some(j) = find_close(lines, i + 1, Container::Wrap) {
                        let mut interior: Vec<&str> = Vec::new();
                        if !rest.is_empty() {
                            interior.push(rest.as_str());
                        }
                        interior.extend_from_slice(&lines[i + 1..j]);
                        out.push(BlockIr::WrapBlock {
                            name: tag.name,
                            attributes: tag.attributes,
                            children: parse_blocks(&interior),
                        });
                        i = j + 1;
                        continue;
                    }
                }
                LineTag::GridOpen => {
                    if let Some(j) = find_close(lines, i + 1, Container::Grid) {
                        out.push(BlockIr::Grid {
                            children: parse_blocks(&lines[i + 1..j]),
                        });
                        i = j + 1;
                        continue;
                    }
                }
                // A stray close tag has nothing to close; degrade to text.
                LineTag::QuoteClose | LineTag::WrapClose | LineTag::GridClose => {}
            }
        }

        if classify::thematic_break(line) {
            out.push(BlockIr::ThematicBreak);
            i += 1;
            continue;
        }

        if let Some((level, text)) = classify::atx_heading(line) {
            out.push(BlockIr::Heading {
                level,
                text: text.to_string(),
            });
            i += 1;
            continue;
        }

        if let Some(fence) = classify::fence_open(line) {
            let (block, next) = parse_fenced_code(lines, i, &fence);
            out.push(block);
            i = next;
            continue;
        }

        if classify::indent_width(line) >= 4 {
            let (block, next) = parse_indented_code(lines, i);
            out.push(block);
            i = next;
            continue;
        }

        if classify::blockquote_content(line).is_some() {
            let mut interior: Vec<&str> = Vec::new();
            let mut j = i;
            while j < lines.len() {
                match classify::blockquote_content(lines[j]) {
                    Some(rest) => {
                        interior.push(rest);
                        j += 1;
                    }
                    None => break,
                }
            }
            out.push(BlockIr::Blockquote {
                children: parse_blocks(&interior),
            });
            i = j;
            continue;
        }

        if classify::list_marker(line).is_some() {
            let (block, next) = parse_list(lines, i);
            out.push(block);
            i = next;
            continue;
        }

        if classify::looks_like_table_row(line)
            && !classify::table_delimiter_row(line)
            && i + 1 < lines.len()
            && classify::table_delimiter_row(lines[i + 1])
        {
            let (block, next) = parse_table(lines, i);
            out.push(block);
            i = next;
            continue;
        }

        // Paragraph: accumulate until a blank line or an interrupting opener.
        let mut text_lines: Vec<&str> = Vec::new();
        let mut j = i;
        while j < lines.len() {
            let l = lines[j];
            if classify::is_blank(l) {
                break;
            }
            if j > i && interrupts_paragraph(lines, j) {
                break;
            }
            text_lines.push(l.trim_start());
            j += 1;
        }
        let text = text_lines.join("\n");
        out.push(BlockIr::Paragraph {
            text: text.trim_end_matches(' ').to_string(),
        });
        i = j;
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Quote,
    Wrap,
    Grid,
}

/// Find the line index of the matching close tag, honoring nesting of the
/// same container kind and skipping fenced-code interiors.
fn find_close(lines: &[&str], from: usize, kind: Container) -> Option<usize> {
    let mut depth = 0usize;
    let mut fence: Option<Fence> = None;
    for (j, line) in lines.iter().enumerate().skip(from) {
        if let Some(f) = &fence {
            if classify::fence_close(line, f) {
                fence = None;
            }
            continue;
        }
        if let Some(f) = classify::fence_open(line) {
            fence = Some(f);
            continue;
        }
        match (kind, classify::line_tag(line)) {
            (Container::Quote, Some(LineTag::QuoteOpen { .. }))
            | (Container::Wrap, Some(LineTag::WrapOpen { .. }))
            | (Container::Grid, Some(LineTag::GridOpen)) => depth += 1,
            (Container::Quote, Some(LineTag::QuoteClose))
            | (Container::Wrap, Some(LineTag::WrapClose))
            | (Container::Grid, Some(LineTag::GridClose)) => {
                if depth == 0 {
                    return Some(j);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// For single-line containers (`[quote]text[/quote]`): if `rest` ends with
/// the close tag, return the interior.
fn strip_trailing_close<'a>(rest: &'a str, close: &str) -> Option<&'a str> {
    rest.trim_end().strip_suffix(close).map(str::trim_end)
}

fn parse_fenced_code(lines: &[&str], start: usize, fence: &Fence) -> (BlockIr, usize) {
    let mut literal = String::new();
    let mut j = start + 1;
    while j < lines.len() && !classify::fence_close(lines[j], fence) {
        literal.push_str(lines[j]);
        literal.push('\n');
        j += 1;
    }
    if literal.ends_with('\n') {
        literal.pop();
    }
    let language = fence
        .info
        .as_ref()
        .and_then(|s| s.split_whitespace().next())
        .map(str::to_string);
    let next = if j < lines.len() { j + 1 } else { j };
    (BlockIr::FencedCode { language, literal }, next)
}

/// 4-space indented code produces the same tree shape as a language-less
/// fenced block.
fn parse_indented_code(lines: &[&str], start: usize) -> (BlockIr, usize) {
    let mut literal_lines: Vec<String> = Vec::new();
    let mut pending_blanks = 0usize;
    let mut j = start;
    while j < lines.len() {
        let l = lines[j];
        if classify::is_blank(l) {
            pending_blanks += 1;
            j += 1;
            continue;
        }
        if classify::indent_width(l) >= 4 {
            for _ in 0..pending_blanks {
                literal_lines.push(String::new());
            }
            pending_blanks = 0;
            literal_lines.push(classify::strip_indent(l, 4).to_string());
            j += 1;
        } else {
            break;
        }
    }
    (
        BlockIr::FencedCode {
            language: None,
            literal: literal_lines.join("\n"),
        },
        j,
    )
}

fn parse_list(lines: &[&str], start: usize) -> (BlockIr, usize) {
    let first = classify::list_marker(lines[start]).expect("caller checked list marker");
    let ordered = first.ordered;
    let list_indent = first.indent;
    let content_threshold = first.content_col;

    let mut items: Vec<ListItemIr> = Vec::new();
    let mut tight = true;
    let mut i = start;

    while i < lines.len() {
        let Some(m) = classify::list_marker(lines[i]) else {
            break;
        };
        if m.ordered != ordered || m.indent < list_indent || m.indent >= content_threshold {
            break;
        }

        let content_col = m.content_col;
        let mut item_lines: Vec<&str> = vec![&lines[i][m.content_offset.min(lines[i].len())..]];
        i += 1;

        let mut pending_blanks = 0usize;
        let mut saw_blank_in_item = false;
        while i < lines.len() {
            let l = lines[i];
            if classify::is_blank(l) {
                pending_blanks += 1;
                i += 1;
                continue;
            }
            if classify::indent_width(l) >= content_col {
                if pending_blanks > 0 {
                    saw_blank_in_item = true;
                    for _ in 0..pending_blanks {
                        item_lines.push("");
                    }
                    pending_blanks = 0;
                }
                item_lines.push(classify::strip_indent(l, content_col));
                i += 1;
                continue;
            }
            if pending_blanks > 0 {
                // Blank line(s) before the next item make the list loose.
                if let Some(next) = classify::list_marker(l) {
                    if next.ordered == ordered
                        && next.indent >= list_indent
                        && next.indent < content_threshold
                    {
                        tight = false;
                    }
                }
            }
            break;
        }
        if saw_blank_in_item {
            tight = false;
        }

        items.push(ListItemIr {
            index: ordered.then_some(m.index),
            children: parse_blocks(&item_lines),
        });

        if i >= lines.len() {
            break;
        }
        match classify::list_marker(lines[i]) {
            Some(next)
                if next.ordered == ordered
                    && next.indent >= list_indent
                    && next.indent < content_threshold => {}
            _ => break,
        }
    }

    let block = if ordered {
        BlockIr::OrderedList {
            start: first.index,
            tight,
            items,
        }
    } else {
        BlockIr::BulletedList { tight, items }
    };
    (block, i)
}

fn parse_table(lines: &[&str], start: usize) -> (BlockIr, usize) {
    let mut rows = vec![TableRowIr {
        header: true,
        cells: classify::split_table_row(lines[start]),
    }];
    let mut j = start + 2; // skip the delimiter row
    while j < lines.len()
        && !classify::is_blank(lines[j])
        && classify::looks_like_table_row(lines[j])
    {
        rows.push(TableRowIr {
            header: false,
            cells: classify::split_table_row(lines[j]),
        });
        j += 1;
    }
    (BlockIr::Table { rows }, j)
}

fn interrupts_paragraph(lines: &[&str], j: usize) -> bool {
    let l = lines[j];
    classify::atx_heading(l).is_some()
        || classify::fence_open(l).is_some()
        || classify::thematic_break(l)
        || classify::blockquote_content(l).is_some()
        || classify::list_marker(l).is_some()
        || classify::line_tag(l).is_some()
        || (classify::looks_like_table_row(l)
            && j + 1 < lines.len()
            && classify::table_delimiter_row(lines[j + 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Vec<BlockIr> {
        let lines: Vec<&str> = text.lines().collect();
        parse_blocks(&lines)
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let blocks = parse("one\ntwo\n\nthree");
        assert_eq!(
            blocks,
            vec![
                BlockIr::Paragraph {
                    text: "one\ntwo".to_string()
                },
                BlockIr::Paragraph {
                    text: "three".to_string()
                },
            ]
        );
    }

    #[test]
    fn heading_interrupts_paragraph() {
        let blocks = parse("text\n# Title");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[1],
            BlockIr::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
    }

    #[test]
    fn fenced_and_indented_code_are_equivalent_shapes() {
        let fenced = parse("```\nlet x = 1;\n```");
        let indented = parse("    let x = 1;");
        assert_eq!(
            fenced,
            vec![BlockIr::FencedCode {
                language: None,
                literal: "let x = 1;".to_string()
            }]
        );
        assert_eq!(fenced, indented);
    }

    #[test]
    fn fence_language_is_first_info_word() {
        let blocks = parse("```rust ignore\ncode\n```");
        assert_eq!(
            blocks,
            vec![BlockIr::FencedCode {
                language: Some("rust".to_string()),
                literal: "code".to_string()
            }]
        );
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let blocks = parse("```\nabc");
        assert_eq!(
            blocks,
            vec![BlockIr::FencedCode {
                language: None,
                literal: "abc".to_string()
            }]
        );
    }

    #[test]
    fn ordered_list_keeps_start_and_explicit_indexes() {
        let blocks = parse("1. Item 1\n5. Item 2");
        match &blocks[0] {
            BlockIr::OrderedList {
                start,
                tight,
                items,
            } => {
                assert_eq!(*start, 1);
                assert!(*tight);
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].index, Some(1));
                assert_eq!(items[1].index, Some(5));
            }
            other => panic!("expected ordered list, got {other:?}"),
        }
    }

    #[test]
    fn bullet_markers_are_interchangeable() {
        let dash = parse("- a\n- b");
        let star = parse("* a\n* b");
        let plus = parse("+ a\n+ b");
        assert_eq!(dash, star);
        assert_eq!(dash, plus);
    }

    #[test]
    fn blank_between_items_makes_list_loose() {
        let blocks = parse("- a\n\n- b");
        match &blocks[0] {
            BlockIr::BulletedList { tight, items } => {
                assert!(!tight);
                assert_eq!(items.len(), 2);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn nested_list_inside_item() {
        let blocks = parse("- top\n  - sub");
        match &blocks[0] {
            BlockIr::BulletedList { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].children.len(), 2);
                assert!(matches!(items[0].children[1], BlockIr::BulletedList { .. }));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn blockquote_nesting() {
        let blocks = parse("> outer\n> > inner");
        match &blocks[0] {
            BlockIr::Blockquote { children } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], BlockIr::Blockquote { .. }));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn quote_container_with_attribution() {
        let blocks = parse("[quote=\"sam, post:3, topic:17\"]\nquoted text\n[/quote]");
        match &blocks[0] {
            BlockIr::QuoteBlock {
                attribution,
                children,
            } => {
                let a = attribution.as_ref().unwrap();
                assert_eq!(a.username, "sam");
                assert_eq!(a.post_number, Some(3));
                assert_eq!(a.topic_id, Some(17));
                assert_eq!(
                    children,
                    &vec![BlockIr::Paragraph {
                        text: "quoted text".to_string()
                    }]
                );
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn single_line_quote_container() {
        let blocks = parse("[quote]inline quoted[/quote]");
        match &blocks[0] {
            BlockIr::QuoteBlock { children, .. } => {
                assert_eq!(
                    children,
                    &vec![BlockIr::Paragraph {
                        text: "inline quoted".to_string()
                    }]
                );
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn unclosed_quote_tag_degrades_to_text() {
        let blocks = parse("[quote]\nnever closed");
        assert_eq!(
            blocks,
            vec![BlockIr::Paragraph {
                text: "[quote]\nnever closed".to_string()
            }]
        );
    }

    #[test]
    fn close_tag_inside_fence_is_ignored() {
        let blocks = parse("[wrap]\n```\n[/wrap]\n```\n[/wrap]");
        match &blocks[0] {
            BlockIr::WrapBlock { children, .. } => {
                assert_eq!(children.len(), 1);
                assert!(matches!(children[0], BlockIr::FencedCode { .. }));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn nested_wrap_containers() {
        let blocks = parse("[wrap=outer]\n[wrap=inner]\nx\n[/wrap]\n[/wrap]");
        match &blocks[0] {
            BlockIr::WrapBlock { name, children, .. } => {
                assert_eq!(name.as_deref(), Some("outer"));
                assert!(matches!(&children[0], BlockIr::WrapBlock { name, .. } if name.as_deref() == Some("inner")));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn table_rows_collected_raw() {
        let blocks = parse("| a | b |\n|---|---|\n| 1 | 2 | 3 |");
        match &blocks[0] {
            BlockIr::Table { rows } => {
                assert_eq!(rows.len(), 2);
                assert!(rows[0].header);
                assert_eq!(rows[0].cells, vec!["a", "b"]);
                assert_eq!(rows[1].cells, vec!["1", "2", "3"]);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn pipe_without_delimiter_row_is_a_paragraph() {
        let blocks = parse("a | b");
        assert_eq!(
            blocks,
            vec![BlockIr::Paragraph {
                text: "a | b".to_string()
            }]
        );
    }

    #[test]
    fn thematic_break_variants() {
        for src in ["---", "***", "___", "\u{2013}\u{2013}\u{2013}"] {
            assert_eq!(parse(src), vec![BlockIr::ThematicBreak], "{src}");
        }
    }

    #[test]
    fn thematic_break_wins_over_list() {
        let blocks = parse("- - -");
        assert_eq!(blocks, vec![BlockIr::ThematicBreak]);
    }

    #[test]
    fn grid_container_collects_interior() {
        let blocks = parse("[grid]\n![a](x.png)\n![b](y.png)\n[/grid]");
        match &blocks[0] {
            // Consecutive image lines form one paragraph; the tree builder
            // lifts the images out.
            BlockIr::Grid { children } => assert_eq!(children.len(), 1),
            other => panic!("{other:?}"),
        }
    }
}
