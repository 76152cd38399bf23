//! Escape-once URL encoding for link and image destinations.

/// Characters that would break out of a `(...)` destination or be reparsed.
fn needs_encoding(b: u8) -> bool {
    matches!(b, b' ' | b'(' | b')' | b'<' | b'>' | b'"' | b'`' | b'\\') || b < 0x20
}

/// Percent-escape a URL exactly once: existing `%XX` sequences are copied
/// verbatim, only not-yet-escaped reserved characters are encoded.
/// Re-encoding an already-escaped URL is the identity.
pub fn escape_url_once(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut out = String::with_capacity(url.len());
    let mut iter = url.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if c == '%' {
            let escaped = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if escaped {
                out.push_str(&url[i..i + 3]);
                iter.next();
                iter.next();
            } else {
                out.push_str("%25");
            }
        } else if c.is_ascii() && needs_encoding(c as u8) {
            out.push_str(&format!("%{:02X}", c as u8));
        } else {
            out.push(c);
        }
    }
    out
}
