//! Context-sensitive escaping for plain text runs.
//!
//! Escapes only what would reparse as syntax: a small always-escaped set,
//! plus line-start characters that would open a block. Escaping is total —
//! any input produces some output — so serialization can never lose user
//! content by failing.

/// Characters escaped anywhere in a plain text run.
fn always_escaped(c: char) -> bool {
    matches!(c, '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '~')
}

/// Escape a plain text run. `at_line_start` says whether the run begins at
/// the start of an output line; the flag re-arms after every newline inside
/// the run.
pub fn escape_text(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut line_start = at_line_start;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if line_start && !c.is_whitespace() {
            line_start = false;
            match c {
                '#' | '>' | '-' | '+' => {
                    out.push('\\');
                    out.push(c);
                    continue;
                }
                '0'..='9' => {
                    // An ordinal like "12. " would open an ordered list;
                    // escape the dot, not the digits.
                    let mut digits = String::new();
                    digits.push(c);
                    while let Some(&d) = chars.peek() {
                        if d.is_ascii_digit() {
                            digits.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(&digits);
                    if let Some(&p) = chars.peek() {
                        if p == '.' || p == ')' {
                            chars.next();
                            out.push('\\');
                            out.push(p);
                        }
                    }
                    continue;
                }
                _ => {}
            }
        }
        if c == '\n' {
            line_start = true;
            out.push('\n');
            continue;
        }
        if c == '!' && chars.peek() == Some(&'[') {
            out.push('\\');
            out.push('!');
            continue;
        }
        if always_escaped(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_text("a*b_c`d", false), r"a\*b\_c\`d");
        assert_eq!(escape_text("[x]", false), r"\[x\]");
    }

    #[test]
    fn line_start_block_openers() {
        assert_eq!(escape_text("# not a heading", true), r"\# not a heading");
        assert_eq!(escape_text("> not a quote", true), r"\> not a quote");
        assert_eq!(escape_text("- not a list", true), r"\- not a list");
        assert_eq!(escape_text("12. not a list", true), r"12\. not a list");
    }

    #[test]
    fn mid_line_is_untouched() {
        assert_eq!(escape_text("# hash", false), "# hash");
        assert_eq!(escape_text("1. number", false), "1. number");
    }

    #[test]
    fn newline_rearms_line_start() {
        assert_eq!(escape_text("a\n# b", false), "a\n\\# b");
    }

    #[test]
    fn image_bang_is_escaped() {
        assert_eq!(escape_text("![alt](x)", false), r"\!\[alt\](x)");
        assert_eq!(escape_text("hi!", false), "hi!");
    }
}
