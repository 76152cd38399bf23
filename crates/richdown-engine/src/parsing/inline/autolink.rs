//! Bare-URL grammar for synthetic link marks.

use std::sync::LazyLock;

use regex::Regex;

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    // A www. host needs at least one more dot to count as a domain.
    Regex::new(r"^(?:https?://[^\s<>]+|www\.[^\s<>.]+\.[^\s<>]+)")
        .expect("bare url pattern compiles")
});

/// Trailing punctuation that linkifiers conventionally leave outside a URL.
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"'];

/// If `rest` begins with a bare URL, return its length in bytes.
pub fn match_bare_url(rest: &str) -> Option<usize> {
    let m = BARE_URL.find(rest)?;
    let trimmed = m.as_str().trim_end_matches(TRAILING);
    // "www." alone (or a scheme with nothing after it) is not a link yet.
    if trimmed == "www." || trimmed.ends_with("://") {
        return None;
    }
    Some(trimmed.len())
}

/// Whether the whole of `text` matches the bare-URL grammar. Reconciliation
/// uses this to drop auto link marks that edits have invalidated.
pub fn is_bare_url(text: &str) -> bool {
    match_bare_url(text) == Some(text.len())
}

/// The href for a bare URL: scheme-less `www.` hosts get an explicit scheme.
pub fn href_for(url: &str) -> String {
    if url.starts_with("www.") {
        format!("http://{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_scheme_and_www_forms() {
        assert_eq!(match_bare_url("https://example.com/x"), Some(21));
        assert_eq!(match_bare_url("www.example.com rest"), Some(15));
        assert_eq!(match_bare_url("ftp.example.com"), None);
        assert_eq!(match_bare_url("word"), None);
    }

    #[test]
    fn trailing_punctuation_stays_outside() {
        assert_eq!(match_bare_url("www.example.com."), Some(15));
        assert_eq!(match_bare_url("https://example.com),"), Some(19));
    }

    #[test]
    fn partial_spans_are_not_urls() {
        assert!(is_bare_url("www.example.com"));
        assert!(!is_bare_url("www.example"));
        assert!(!is_bare_url("www."));
        assert!(!is_bare_url("https://"));
        assert!(!is_bare_url("www.example.com and more"));
    }

    #[test]
    fn www_hosts_get_a_scheme() {
        assert_eq!(href_for("www.example.com"), "http://www.example.com");
        assert_eq!(href_for("https://example.com"), "https://example.com");
    }
}
