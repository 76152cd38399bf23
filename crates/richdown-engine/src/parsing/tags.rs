//! Parsing for the square-bracket container tags: `[quote]`, `[wrap]` and
//! `[grid]`. Shared between the block classifier (tags at line start open
//! block containers) and the inline scanner (wrap tags mid-paragraph become
//! inline wrap nodes).

use std::collections::BTreeMap;

use crate::dom::QuoteAttribution;

pub const QUOTE_CLOSE: &str = "[/quote]";
pub const WRAP_CLOSE: &str = "[/wrap]";
pub const GRID_OPEN: &str = "[grid]";
pub const GRID_CLOSE: &str = "[/grid]";

/// A parsed `[wrap...]` open tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrapTag {
    pub name: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Parse a `[quote]` / `[quote="..."]` open tag at the start of `text`.
/// Returns the attribution (if any) and the consumed byte length.
pub fn quote_open(text: &str) -> Option<(Option<QuoteAttribution>, usize)> {
    let rest = text.strip_prefix("[quote")?;
    if let Some(after) = rest.strip_prefix(']') {
        let _ = after;
        return Some((None, "[quote]".len()));
    }
    let rest = rest.strip_prefix('=')?;
    let (value, value_len) = tag_value(rest)?;
    let rest = &rest[value_len..];
    if !rest.starts_with(']') {
        return None;
    }
    let consumed = "[quote=".len() + value_len + 1;
    Some((Some(parse_attribution(&value)), consumed))
}

/// Parse a `[wrap...]` open tag at the start of `text`.
/// Returns the tag and the consumed byte length.
pub fn wrap_open(text: &str) -> Option<(WrapTag, usize)> {
    let mut tag = WrapTag::default();
    let mut i = text.strip_prefix("[wrap").map(|r| text.len() - r.len())?;
    let bytes = text.as_bytes();

    if bytes.get(i) == Some(&b'=') {
        let (value, value_len) = tag_value(&text[i + 1..])?;
        tag.name = Some(value);
        i += 1 + value_len;
    }
    loop {
        while bytes.get(i) == Some(&b' ') {
            i += 1;
        }
        match bytes.get(i) {
            Some(b']') => return Some((tag, i + 1)),
            Some(_) => {
                let key_start = i;
                while bytes
                    .get(i)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
                {
                    i += 1;
                }
                if i == key_start || bytes.get(i) != Some(&b'=') {
                    return None;
                }
                let key = text[key_start..i].to_string();
                let (value, value_len) = tag_value(&text[i + 1..])?;
                i += 1 + value_len;
                tag.attributes.insert(key, value);
            }
            None => return None,
        }
    }
}

/// A tag value: either double-quoted (may contain spaces) or bare (runs to
/// the next space or `]`). Returns the value and its source length.
fn tag_value(text: &str) -> Option<(String, usize)> {
    if let Some(rest) = text.strip_prefix('"') {
        let end = rest.find('"')?;
        return Some((rest[..end].to_string(), end + 2));
    }
    let end = text
        .find(|c: char| c == ' ' || c == ']')
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    Some((text[..end].to_string(), end))
}

/// Parse a quote attribution of the form `username, post:3, topic:17`.
/// Unknown segments are ignored; a bare string is just a username.
pub fn parse_attribution(s: &str) -> QuoteAttribution {
    let mut attribution = QuoteAttribution {
        username: String::new(),
        post_number: None,
        topic_id: None,
    };
    for (n, part) in s.split(',').map(str::trim).enumerate() {
        if let Some(v) = part.strip_prefix("post:") {
            attribution.post_number = v.parse().ok();
        } else if let Some(v) = part.strip_prefix("topic:") {
            attribution.topic_id = v.parse().ok();
        } else if n == 0 {
            attribution.username = part.to_string();
        }
    }
    attribution
}

/// Render an attribution back into tag-value form.
pub fn attribution_to_string(a: &QuoteAttribution) -> String {
    let mut out = a.username.clone();
    if let Some(post) = a.post_number {
        out.push_str(&format!(", post:{post}"));
    }
    if let Some(topic) = a.topic_id {
        out.push_str(&format!(", topic:{topic}"));
    }
    out
}
