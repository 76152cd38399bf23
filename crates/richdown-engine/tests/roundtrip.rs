//! Round-trip and conversion properties of the whole engine: for any
//! parse-produced document, reparsing its serialization yields an equal
//! tree, and the documented edge cases hold.

use pretty_assertions::assert_eq;
use rstest::rstest;

use richdown_engine::snapshot::check_invariants;
use richdown_engine::{Cmd, EditSession, MarkKind, NodeKind, parse, serialize};

#[rstest]
#[case::headings("# one\n\n## two three")]
#[case::paragraphs("first para\nsecond line\n\nsecond para")]
#[case::emphasis("**bold** *italic* ~~strike~~ `code`")]
#[case::nested_emphasis("***both*** and **outer *inner* text**")]
#[case::tight_list("- a\n- b\n  - nested")]
#[case::loose_list("- a\n\n- b")]
#[case::ordered_list("1. Item 1\n5. Item 2")]
#[case::blockquote("> quote\n>\n> more\n> > deeper")]
#[case::fenced_code("```rust\nfn main() {}\n```")]
#[case::indented_code("    indented code")]
#[case::quote_block("[quote=\"sam, post:3, topic:17\"]\nquoted\n[/quote]")]
#[case::wrap_block("[wrap=info]\ncontent\n[/wrap]")]
#[case::wrap_with_attrs("[wrap=box color=red]\nx\n[/wrap]")]
#[case::inline_wrap("before [wrap=key]inner[/wrap] after")]
#[case::table("| a | b |\n|---|---|\n| 1 | 2 |")]
#[case::ragged_table("| a | b |\n|---|---|\n| 1 | 2 | 3 |")]
#[case::thematic_break("---")]
#[case::emoji("Hello :tada: and :)")]
#[case::mention_hashtag("@sam and #dev")]
#[case::autolinks("<https://example.com> and www.example.com")]
#[case::image("![cat|640x480,75%](upload://abc.png)")]
#[case::grid("[grid]\n![a](x.png)\n![b](y.png)\n[/grid]")]
#[case::hard_break("line one\\\nline two")]
#[case::typographics("wait... what -- really (tm)")]
#[case::escapes("text with \\*escaped\\* stars")]
#[case::links("[text](https://example.com \"title\") and [plain](/relative)")]
#[case::mixed(
    "# Post\n\nIntro with **bold** and @mention.\n\n- point one\n- point two\n\n> quoted reply\n\n```\ncode\n```"
)]
fn parse_serialize_parse_is_stable(#[case] src: &str) {
    let first = parse(src);
    check_invariants(&first);

    let markdown = serialize(&first);
    let second = parse(&markdown);
    check_invariants(&second);

    assert_eq!(first, second, "serialized form was:\n{markdown}");
}

#[rstest]
#[case("**x**")]
#[case("www.example.com")]
#[case("@user")]
#[case(":)")]
#[case("[link](https://x.test)")]
#[case("__dunder__")]
fn code_spans_suppress_all_inline_rules(#[case] payload: &str) {
    let doc = parse(&format!("`{payload}`"));
    let para = doc.children(doc.root())[0];
    let runs = doc.children(para);
    assert_eq!(runs.len(), 1);
    let run = runs[0];
    assert!(matches!(doc.kind(run), NodeKind::Text { text } if text == payload));
    let marks = doc.marks(run);
    assert!(marks.code);
    assert!(!marks.bold && !marks.italic && marks.link.is_none());
}

#[test]
fn code_span_boundary_does_not_pair_with_outside() {
    let doc = parse("`__code` should not__ be bold.");
    let para = doc.children(doc.root())[0];
    for &run in doc.children(para) {
        assert!(!doc.marks(run).bold, "nothing here may be bold");
    }
}

#[test]
fn ordered_list_start_and_explicit_index() {
    let doc = parse("1. Item 1\n5. Item 2");
    let list = doc.children(doc.root())[0];
    let NodeKind::OrderedList { start, .. } = doc.kind(list) else {
        panic!("expected an ordered list");
    };
    assert_eq!(*start, 1);
    let items = doc.children(list);
    assert_eq!(doc.kind(items[1]), &NodeKind::ListItem { index: Some(5) });
}

#[test]
fn link_wrapping_marked_text_is_canonical() {
    let src = "[**Bold** and *italic* text](https://example.com)";
    assert_eq!(serialize(&parse(src)), format!("{src}\n"));
}

#[test]
fn bare_url_produces_auto_link() {
    let doc = parse("www.example.com");
    let para = doc.children(doc.root())[0];
    let run = doc.children(para)[0];
    let link = doc.marks(run).link.as_ref().expect("auto link mark");
    assert!(link.auto);
    assert_eq!(link.href, "http://www.example.com");
}

#[test]
fn editing_past_url_grammar_drops_the_link() {
    let mut session = EditSession::new("www.example.com");
    let block = session.document().children(session.document().root())[0];
    session
        .apply(Cmd::DeleteRange {
            block,
            range: 11..15,
        })
        .unwrap();
    let doc = session.document();
    assert_eq!(doc.marks(doc.children(block)[0]).link, None);
}

#[test]
fn ragged_table_serializes_every_row_at_max_width() {
    let out = serialize(&parse("| a | b |\n|---|---|\n| 1 | 2 | 3 |"));
    for line in out.lines() {
        assert_eq!(
            line.matches('|').count(),
            4,
            "every row (and the separator) must have 3 columns: {line}"
        );
    }
}

#[test]
fn toggle_round_trip_preserves_document() {
    let mut session = EditSession::new("some **mixed** content");
    let before = session.document().clone();
    let block = session.document().children(session.document().root())[0];
    for _ in 0..2 {
        session
            .apply(Cmd::ToggleMark {
                block,
                range: 0..4,
                mark: MarkKind::Italic,
            })
            .unwrap();
    }
    assert_eq!(session.document(), &before);
}

#[test]
fn no_op_edit_session_round_trips_through_markdown() {
    let src = "# Title\n\nbody with **marks**, a [link](https://x.test), and :tada:\n\n- one\n- two\n";
    let session = EditSession::new(src);
    let out = session.to_markdown();
    assert_eq!(parse(&out), parse(src));
}

#[test]
fn unresolved_references_round_trip_byte_identical() {
    let src = "ping @Ghost_User and #unknown-tag\n";
    let doc = parse(src);
    assert_eq!(serialize(&doc), src);
}

#[test]
fn malformed_input_degrades_to_text_not_errors() {
    // Unclosed constructs of every kind; parsing must produce a document
    // and the round trip must still hold.
    for src in [
        "[quote]\nno close",
        "[wrap=x no close",
        "`unclosed",
        "**unclosed",
        "[link](unclosed",
        "<notaurl",
        "| only | header |",
    ] {
        let doc = parse(src);
        check_invariants(&doc);
        assert_eq!(parse(&serialize(&doc)), doc, "for input {src:?}");
    }
}
