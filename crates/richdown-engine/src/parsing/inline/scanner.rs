//! Token scanner: first phase of inline parsing.
//!
//! Walks a block's content byte-by-byte, emitting flat tokens. Precedence is
//! positional: whichever construct starts first wins, and code spans are raw
//! zones whose content is never scanned further. Constructs that fail to
//! close restore the cursor and fall back to literal text.

use std::collections::BTreeMap;

use super::cursor::Cursor;
use super::{autolink, emoji, typographic};
use crate::options::ParseOptions;
use crate::parsing::tags;

/// A scanned inline token. Delimiter runs are kept unresolved; pairing
/// happens in the `emphasis` pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Text(String),
    /// Code span content (delimiters stripped, interior raw).
    Code(String),
    Delim {
        ch: u8,
        len: usize,
        can_open: bool,
        can_close: bool,
    },
    Link {
        children: Vec<Tok>,
        href: String,
        title: Option<String>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
        scale: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Autolink(String),
    BareUrl(String),
    Emoji(String),
    Mention(String),
    Hashtag(String),
    InlineWrap {
        name: Option<String>,
        attributes: BTreeMap<String, String>,
        children: Vec<Tok>,
    },
    HardBreak,
}

pub fn scan(text: &str, opts: &ParseOptions) -> Vec<Tok> {
    let mut cur = Cursor::new(text);
    let mut toks: Vec<Tok> = Vec::new();
    let mut buf = String::new();

    macro_rules! flush {
        () => {
            if !buf.is_empty() {
                toks.push(Tok::Text(std::mem::take(&mut buf)));
            }
        };
    }
    macro_rules! emit {
        ($tok:expr) => {{
            flush!();
            toks.push($tok);
        }};
    }

    while let Some(b) = cur.peek() {
        match b {
            b'\\' => match cur.peek_at(1) {
                Some(b'\n') => {
                    cur.bump_n(2);
                    trim_trailing_spaces(&mut buf);
                    emit!(Tok::HardBreak);
                }
                Some(c) if c.is_ascii_punctuation() => {
                    cur.bump_n(2);
                    buf.push(c as char);
                }
                _ => {
                    cur.bump();
                    buf.push('\\');
                }
            },
            b'`' => match try_code_span(&mut cur) {
                Some(t) => emit!(t),
                None => {
                    let n = cur.run_len(b'`');
                    for _ in 0..n {
                        buf.push('`');
                    }
                    cur.bump_n(n);
                }
            },
            b'\n' => {
                cur.bump();
                if trim_trailing_spaces(&mut buf) >= 2 {
                    emit!(Tok::HardBreak);
                } else {
                    buf.push('\n');
                }
            }
            b'<' => {
                if let Some(t) = try_autolink(&mut cur) {
                    emit!(t);
                } else if let Some(t) = try_text_shortcut(&mut cur, opts) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push('<');
                }
            }
            b'!' => {
                if cur.peek_at(1) == Some(b'[') {
                    match try_image(&mut cur) {
                        Some(t) => emit!(t),
                        None => {
                            cur.bump();
                            buf.push('!');
                        }
                    }
                } else if let Some(rep) = try_typographic(&mut cur, opts) {
                    buf.push_str(rep);
                } else {
                    cur.bump();
                    buf.push('!');
                }
            }
            b'[' => {
                if let Some(t) = try_inline_wrap(&mut cur, opts) {
                    emit!(t);
                } else if let Some(t) = try_link(&mut cur, opts) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push('[');
                }
            }
            b'*' | b'_' => {
                let t = scan_delimiter(&mut cur, b);
                emit!(t);
            }
            b'~' => {
                if cur.run_len(b'~') >= 2 {
                    let t = scan_delimiter(&mut cur, b);
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push('~');
                }
            }
            b':' => {
                if let Some(t) = try_emoji_shortcode(&mut cur, opts) {
                    emit!(t);
                } else if let Some(t) = try_text_shortcut(&mut cur, opts) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push(':');
                }
            }
            b';' | b'>' => {
                if let Some(t) = try_text_shortcut(&mut cur, opts) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push(b as char);
                }
            }
            b'@' => {
                if let Some(t) = try_mention(&mut cur) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push('@');
                }
            }
            b'#' => {
                if let Some(t) = try_hashtag(&mut cur) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push('#');
                }
            }
            b'h' | b'w' => {
                if let Some(t) = try_bare_url(&mut cur) {
                    emit!(t);
                } else {
                    cur.bump();
                    buf.push(b as char);
                }
            }
            b'.' | b'-' | b'(' | b'?' => {
                if let Some(rep) = try_typographic(&mut cur, opts) {
                    buf.push_str(rep);
                } else {
                    cur.bump();
                    buf.push(b as char);
                }
            }
            _ => {
                // Multibyte chars pass through whole.
                let c = cur.rest().chars().next().expect("peeked byte");
                cur.bump_n(c.len_utf8());
                buf.push(c);
            }
        }
    }
    flush!();
    toks
}

/// Strip trailing spaces from the buffer, returning how many were removed.
fn trim_trailing_spaces(buf: &mut String) -> usize {
    let trimmed = buf.trim_end_matches(' ').len();
    let removed = buf.len() - trimmed;
    buf.truncate(trimmed);
    removed
}

fn try_typographic<'a>(cur: &mut Cursor<'a>, opts: &ParseOptions) -> Option<&'static str> {
    if !opts.typographics {
        return None;
    }
    let (rep, consumed) = typographic::try_replace(cur.rest())?;
    cur.bump_n(consumed);
    Some(rep)
}

/// A backtick run opens a code span closed by a run of exactly the same
/// length. Interior newlines become spaces; one leading+trailing space pair
/// is stripped when the content isn't all spaces.
fn try_code_span(cur: &mut Cursor<'_>) -> Option<Tok> {
    let n = cur.run_len(b'`');
    if n == 0 {
        return None;
    }
    let rest = &cur.s[cur.pos() + n..];
    let bytes = rest.as_bytes();
    let mut k = 0;
    let close = loop {
        if k >= bytes.len() {
            break None;
        }
        if bytes[k] == b'`' {
            let mut run = 1;
            while k + run < bytes.len() && bytes[k + run] == b'`' {
                run += 1;
            }
            if run == n {
                break Some(k);
            }
            k += run;
        } else {
            k += 1;
        }
    };
    let k = close?;
    let mut content = rest[..k].replace('\n', " ");
    if content.len() >= 2
        && content.starts_with(' ')
        && content.ends_with(' ')
        && content.bytes().any(|c| c != b' ')
    {
        content = content[1..content.len() - 1].to_string();
    }
    cur.bump_n(n + k + n);
    Some(Tok::Code(content))
}

fn try_autolink(cur: &mut Cursor<'_>) -> Option<Tok> {
    let saved = cur.clone();
    cur.bump(); // <
    let scheme =
        cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'.' || b == b'-');
    if scheme.is_empty()
        || !scheme.as_bytes()[0].is_ascii_alphabetic()
        || cur.peek() != Some(b':')
    {
        *cur = saved;
        return None;
    }
    cur.bump(); // :
    let rest = cur.take_while(|b| b != b'>' && b != b'<' && b != b' ' && b != b'\n' && b != b'\t');
    if rest.is_empty() || cur.peek() != Some(b'>') {
        *cur = saved;
        return None;
    }
    cur.bump(); // >
    Some(Tok::Autolink(format!("{scheme}:{rest}")))
}

fn scan_delimiter(cur: &mut Cursor<'_>, ch: u8) -> Tok {
    let len = cur.run_len(ch);
    let prev = cur.prev_char();
    let next = cur.s[cur.pos() + len..].chars().next();
    let (can_open, can_close) = flanking(ch, prev, next);
    cur.bump_n(len);
    Tok::Delim {
        ch,
        len,
        can_open,
        can_close,
    }
}

/// Left/right-flanking per the CommonMark emphasis rules, with `_`
/// additionally barred from intraword use.
fn flanking(ch: u8, prev: Option<char>, next: Option<char>) -> (bool, bool) {
    let prev_ws = prev.is_none_or(char::is_whitespace);
    let next_ws = next.is_none_or(char::is_whitespace);
    let prev_punct = prev.is_some_and(|c| !c.is_whitespace() && !c.is_alphanumeric());
    let next_punct = next.is_some_and(|c| !c.is_whitespace() && !c.is_alphanumeric());

    let left = !next_ws && (!next_punct || prev_ws || prev_punct);
    let right = !prev_ws && (!prev_punct || next_ws || next_punct);

    match ch {
        b'_' => (
            left && (!right || prev_punct),
            right && (!left || next_punct),
        ),
        _ => (left, right),
    }
}

/// Content of a balanced `[...]` group, cursor positioned at `[` on entry
/// and after `]` on success.
fn bracket_content<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    let start = cur.pos() + 1;
    let bytes = cur.s.as_bytes();
    let mut i = start;
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => {
                depth += 1;
                i += 1;
            }
            b']' => {
                if depth == 0 {
                    let content = &cur.s[start..i];
                    cur.i = i + 1;
                    return Some(content);
                }
                depth -= 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// `(dest "title")` following a link/image bracket group. Destination may be
/// `<>`-wrapped; bare destinations allow balanced parens.
fn link_destination(cur: &mut Cursor<'_>) -> Option<(String, Option<String>)> {
    if cur.peek() != Some(b'(') {
        return None;
    }
    cur.bump();
    cur.take_while(|b| b == b' ');
    let href = if cur.peek() == Some(b'<') {
        cur.bump();
        let d = cur.take_while(|b| b != b'>' && b != b'\n');
        if cur.peek() != Some(b'>') {
            return None;
        }
        cur.bump();
        d.to_string()
    } else {
        let start = cur.pos();
        let mut depth = 0u32;
        loop {
            match cur.peek() {
                None | Some(b' ') | Some(b'\n') => break,
                Some(b'(') => {
                    depth += 1;
                    cur.bump();
                }
                Some(b')') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    cur.bump();
                }
                Some(b'\\') => cur.bump_n(2),
                Some(_) => {
                    cur.bump();
                }
            }
        }
        cur.s[start..cur.pos()].to_string()
    };
    cur.take_while(|b| b == b' ');
    let title = match cur.peek() {
        Some(q) if q == b'"' || q == b'\'' => {
            cur.bump();
            let t = cur.take_while(|b| b != q).to_string();
            if cur.peek() != Some(q) {
                return None;
            }
            cur.bump();
            cur.take_while(|b| b == b' ');
            Some(t)
        }
        _ => None,
    };
    if cur.peek() != Some(b')') {
        return None;
    }
    cur.bump();
    Some((href, title))
}

fn try_link(cur: &mut Cursor<'_>, opts: &ParseOptions) -> Option<Tok> {
    let saved = cur.clone();
    let inner = match bracket_content(cur) {
        Some(t) => t,
        None => {
            *cur = saved;
            return None;
        }
    };
    let Some((href, title)) = link_destination(cur) else {
        *cur = saved;
        return None;
    };
    Some(Tok::Link {
        children: scan(inner, opts),
        href,
        title,
    })
}

fn try_image(cur: &mut Cursor<'_>) -> Option<Tok> {
    let saved = cur.clone();
    cur.bump(); // !
    let alt_raw = match bracket_content(cur) {
        Some(t) => t.to_string(),
        None => {
            *cur = saved;
            return None;
        }
    };
    let Some((src, title)) = link_destination(cur) else {
        *cur = saved;
        return None;
    };
    let (alt, width, height, scale) = parse_alt_suffix(&alt_raw);
    Some(Tok::Image {
        src,
        alt,
        title,
        scale,
        width,
        height,
    })
}

/// Split `alt|640x480,75%` into alt text, dimensions and percent scale. An
/// unparseable suffix stays part of the alt text.
fn parse_alt_suffix(alt: &str) -> (String, Option<u32>, Option<u32>, Option<u8>) {
    if let Some((prefix, suffix)) = alt.rsplit_once('|') {
        let mut width = None;
        let mut height = None;
        let mut scale = None;
        let mut ok = !suffix.trim().is_empty();
        for part in suffix.split(',') {
            let part = part.trim();
            if let Some(pct) = part.strip_suffix('%') {
                match pct.parse::<u8>() {
                    Ok(v) if v > 0 && v <= 100 => scale = Some(v),
                    _ => {
                        ok = false;
                        break;
                    }
                }
            } else if let Some((w, h)) = part.split_once('x') {
                match (w.parse(), h.parse()) {
                    (Ok(w), Ok(h)) => {
                        width = Some(w);
                        height = Some(h);
                    }
                    _ => {
                        ok = false;
                        break;
                    }
                }
            } else {
                ok = false;
                break;
            }
        }
        if ok {
            return (prefix.to_string(), width, height, scale);
        }
    }
    (alt.to_string(), None, None, None)
}

fn try_inline_wrap(cur: &mut Cursor<'_>, opts: &ParseOptions) -> Option<Tok> {
    let (tag, tag_len) = tags::wrap_open(cur.rest())?;
    let interior_start = cur.pos() + tag_len;
    let close = find_wrap_close(&cur.s[interior_start..])?;
    let interior = &cur.s[interior_start..interior_start + close];
    let children = scan(interior, opts);
    cur.i = interior_start + close + tags::WRAP_CLOSE.len();
    Some(Tok::InlineWrap {
        name: tag.name,
        attributes: tag.attributes,
        children,
    })
}

/// Offset of the matching `[/wrap]` in `s`, skipping nested wrap pairs.
fn find_wrap_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'[' {
            if s[i..].starts_with(tags::WRAP_CLOSE) {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
                i += tags::WRAP_CLOSE.len();
                continue;
            }
            if let Some((_, len)) = tags::wrap_open(&s[i..]) {
                depth += 1;
                i += len;
                continue;
            }
        }
        i += 1;
    }
    None
}

fn try_emoji_shortcode(cur: &mut Cursor<'_>, opts: &ParseOptions) -> Option<Tok> {
    let saved = cur.clone();
    cur.bump(); // :
    let name =
        cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'+' || b == b'-');
    if !name.is_empty() && cur.peek() == Some(b':') && opts.emoji.contains(name) {
        cur.bump();
        return Some(Tok::Emoji(name.to_string()));
    }
    *cur = saved;
    None
}

/// Text smilies like `:)` expand only when they stand alone between
/// whitespace or line boundaries.
fn try_text_shortcut(cur: &mut Cursor<'_>, opts: &ParseOptions) -> Option<Tok> {
    if !opts.emoji_shortcuts {
        return None;
    }
    if !cur.prev_char().is_none_or(char::is_whitespace) {
        return None;
    }
    for (pat, name) in emoji::TEXT_SHORTCUTS {
        if cur.starts_with(pat) {
            let next = cur.s[cur.pos() + pat.len()..].chars().next();
            if next.is_none_or(char::is_whitespace) {
                cur.bump_n(pat.len());
                return Some(Tok::Emoji((*name).to_string()));
            }
        }
    }
    None
}

fn try_mention(cur: &mut Cursor<'_>) -> Option<Tok> {
    let boundary = cur
        .prev_char()
        .is_none_or(|c| !c.is_alphanumeric() && c != '_');
    if !boundary {
        return None;
    }
    let saved = cur.clone();
    cur.bump(); // @
    let raw = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-');
    let name = raw.trim_end_matches(['.', '-']);
    if name.is_empty() || !(name.as_bytes()[0].is_ascii_alphanumeric() || name.starts_with('_')) {
        *cur = saved;
        return None;
    }
    cur.i = saved.i + 1 + name.len();
    Some(Tok::Mention(name.to_string()))
}

fn try_hashtag(cur: &mut Cursor<'_>) -> Option<Tok> {
    if !cur.prev_char().is_none_or(char::is_whitespace) {
        return None;
    }
    let saved = cur.clone();
    cur.bump(); // #
    let slug = cur.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if slug.is_empty() {
        *cur = saved;
        return None;
    }
    Some(Tok::Hashtag(slug.to_string()))
}

fn try_bare_url(cur: &mut Cursor<'_>) -> Option<Tok> {
    if !cur.prev_char().is_none_or(|c| !c.is_alphanumeric()) {
        return None;
    }
    let len = autolink::match_bare_url(cur.rest())?;
    let url = cur.rest()[..len].to_string();
    cur.bump_n(len);
    Some(Tok::BareUrl(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_default(s: &str) -> Vec<Tok> {
        scan(s, &ParseOptions::default())
    }

    #[test]
    fn code_span_close_must_match_length() {
        // `` ` `` inside double backticks stays literal.
        let toks = scan_default("``a`b``");
        assert_eq!(toks, vec![Tok::Code("a`b".to_string())]);
    }

    #[test]
    fn unclosed_code_span_is_literal() {
        let toks = scan_default("`oops");
        assert_eq!(toks, vec![Tok::Text("`oops".to_string())]);
    }

    #[test]
    fn code_span_space_stripping() {
        let toks = scan_default("` `` `");
        assert_eq!(toks, vec![Tok::Code("``".to_string())]);
    }

    #[test]
    fn delimiter_flanking() {
        let toks = scan_default("*open");
        assert!(matches!(
            toks[0],
            Tok::Delim {
                ch: b'*',
                len: 1,
                can_open: true,
                can_close: false,
            }
        ));
    }

    #[test]
    fn link_title_parses() {
        let toks = scan_default("[t](http://x \"hi\")");
        match &toks[0] {
            Tok::Link { href, title, .. } => {
                assert_eq!(href, "http://x");
                assert_eq!(title.as_deref(), Some("hi"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn angle_wrapped_destination() {
        let toks = scan_default("[t](<http://x y>)");
        match &toks[0] {
            Tok::Link { href, .. } => assert_eq!(href, "http://x y"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn alt_suffix_variants() {
        assert_eq!(
            parse_alt_suffix("cat|640x480"),
            ("cat".to_string(), Some(640), Some(480), None)
        );
        assert_eq!(
            parse_alt_suffix("cat|50%"),
            ("cat".to_string(), None, None, Some(50))
        );
        assert_eq!(
            parse_alt_suffix("pipe|not dims"),
            ("pipe|not dims".to_string(), None, None, None)
        );
    }

    #[test]
    fn nested_wrap_close_matching() {
        assert_eq!(find_wrap_close("a[wrap]b[/wrap]c[/wrap]"), Some(15));
        assert_eq!(find_wrap_close("no close"), None);
    }

    #[test]
    fn mention_trims_trailing_punctuation() {
        let toks = scan_default("@sam.");
        assert_eq!(toks[0], Tok::Mention("sam".to_string()));
        assert_eq!(toks[1], Tok::Text(".".to_string()));
    }
}
