//! Typographic replacements applied while scanning plain text, never inside
//! code spans. Replacement happens at scan time so backslash escapes always
//! win over substitution.

/// If a typographic replacement starts at the beginning of `rest`, return the
/// replacement string and the number of source bytes consumed.
pub fn try_replace(rest: &str) -> Option<(&'static str, usize)> {
    let bytes = rest.as_bytes();
    match bytes.first()? {
        b'.' => {
            if bytes.starts_with(b"...") {
                // Consume the whole dot run so `....` doesn't leave a stray.
                let run = run_len(bytes, b'.');
                return Some(("\u{2026}", run));
            }
            None
        }
        b'-' => {
            let run = run_len(bytes, b'-');
            match run {
                3.. => Some(("\u{2014}", run)),
                2 => Some(("\u{2013}", 2)),
                _ => None,
            }
        }
        b'!' => {
            let run = run_len(bytes, b'!');
            if run >= 4 {
                return Some(("!!!", run));
            }
            None
        }
        b'?' => {
            let run = run_len(bytes, b'?');
            if run >= 4 {
                return Some(("???", run));
            }
            None
        }
        b'(' => {
            for (pat, rep) in [
                ("(tm)", "\u{2122}"),
                ("(TM)", "\u{2122}"),
                ("(c)", "\u{a9}"),
                ("(C)", "\u{a9}"),
                ("(r)", "\u{ae}"),
                ("(R)", "\u{ae}"),
            ] {
                if rest.starts_with(pat) {
                    return Some((rep, pat.len()));
                }
            }
            None
        }
        _ => None,
    }
}

fn run_len(bytes: &[u8], b: u8) -> usize {
    bytes.iter().take_while(|&&c| c == b).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsis() {
        assert_eq!(try_replace("..."), Some(("\u{2026}", 3)));
        assert_eq!(try_replace("....x"), Some(("\u{2026}", 4)));
        assert_eq!(try_replace(".."), None);
    }

    #[test]
    fn dashes() {
        assert_eq!(try_replace("--"), Some(("\u{2013}", 2)));
        assert_eq!(try_replace("---"), Some(("\u{2014}", 3)));
        assert_eq!(try_replace("-"), None);
    }

    #[test]
    fn symbol_shortcuts() {
        assert_eq!(try_replace("(tm) rest"), Some(("\u{2122}", 4)));
        assert_eq!(try_replace("(c)"), Some(("\u{a9}", 3)));
        assert_eq!(try_replace("(r)"), Some(("\u{ae}", 3)));
        assert_eq!(try_replace("(x)"), None);
    }

    #[test]
    fn shouting_collapses_to_three() {
        assert_eq!(try_replace("!!!!"), Some(("!!!", 4)));
        assert_eq!(try_replace("??????"), Some(("???", 6)));
        assert_eq!(try_replace("!!!"), None);
        assert_eq!(try_replace("???"), None);
    }
}
