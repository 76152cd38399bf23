//! Emphasis resolution: second phase of inline parsing.
//!
//! Pairs delimiter runs closest-opening-wins (the CommonMark emphasis
//! algorithm) and materializes the token stream into [`InlineIr`] runs with
//! well-nested mark sets. Unpaired or partially consumed delimiter runs fall
//! back to literal text.

use std::collections::HashMap;

use super::scanner::Tok;
use super::{InlineIr, InlineKindIr, autolink};
use crate::dom::{LinkMark, MarkKind, MarkSet};
use crate::options::ParseOptions;

struct Entry {
    tok: usize,
    ch: u8,
    len: usize,
    can_open: bool,
    can_close: bool,
    active: bool,
}

struct Pairing {
    from: usize,
    to: usize,
    kind: MarkKind,
}

pub fn resolve(toks: Vec<Tok>, base: &MarkSet, opts: &ParseOptions) -> Vec<InlineIr> {
    let mut entries: Vec<Entry> = toks
        .iter()
        .enumerate()
        .filter_map(|(i, t)| match t {
            Tok::Delim {
                ch,
                len,
                can_open,
                can_close,
            } => Some(Entry {
                tok: i,
                ch: *ch,
                len: *len,
                can_open: *can_open,
                can_close: *can_close,
                active: true,
            }),
            _ => None,
        })
        .collect();

    let mut pairings: Vec<Pairing> = Vec::new();
    for j in 0..entries.len() {
        if !entries[j].can_close {
            continue;
        }
        while entries[j].len > 0 {
            let opener = (0..j).rev().find(|&i| {
                let e = &entries[i];
                e.active
                    && e.can_open
                    && e.ch == entries[j].ch
                    && e.len > 0
                    && (e.ch != b'~' || (e.len >= 2 && entries[j].len >= 2))
            });
            let Some(i) = opener else { break };
            let strength = if entries[j].ch == b'~' {
                2
            } else if entries[i].len >= 2 && entries[j].len >= 2 {
                2
            } else {
                1
            };
            let kind = match (entries[j].ch, strength) {
                (b'~', _) => MarkKind::Strikethrough,
                (_, 2) => MarkKind::Bold,
                _ => MarkKind::Italic,
            };
            pairings.push(Pairing {
                from: entries[i].tok,
                to: entries[j].tok,
                kind,
            });
            entries[i].len -= strength;
            entries[j].len -= strength;
            // A pair seals everything between it: delimiters inside can no
            // longer match delimiters outside.
            for e in entries[i + 1..j].iter_mut() {
                e.active = false;
            }
        }
    }

    let mut additions: Vec<Vec<MarkKind>> = vec![Vec::new(); toks.len()];
    for p in &pairings {
        for marks in additions[p.from + 1..p.to].iter_mut() {
            marks.push(p.kind);
        }
    }
    let leftover: HashMap<usize, usize> = entries
        .iter()
        .filter(|e| e.len > 0)
        .map(|e| (e.tok, e.len))
        .collect();

    let mut out: Vec<InlineIr> = Vec::new();
    for (k, tok) in toks.into_iter().enumerate() {
        let mut marks = base.clone();
        for kind in &additions[k] {
            marks.add(*kind);
        }
        match tok {
            Tok::Text(s) => push_text(&mut out, s, marks),
            // Code is exclusive: nothing else survives on a code run.
            Tok::Code(s) => push_text(&mut out, s, MarkSet::code()),
            Tok::Delim { ch, .. } => {
                let n = leftover.get(&k).copied().unwrap_or(0);
                if n > 0 {
                    push_text(&mut out, (ch as char).to_string().repeat(n), marks);
                }
            }
            Tok::Link {
                children,
                href,
                title,
            } => {
                let mut lm = marks.clone();
                lm.link = Some(LinkMark {
                    href,
                    title,
                    auto: false,
                });
                out.extend(resolve(children, &lm, opts));
            }
            Tok::BareUrl(u) => {
                let mut m = marks.clone();
                // Inside an authored link's text, the authored mark wins;
                // the synthetic one only applies to otherwise-plain spans.
                if m.link.is_none() {
                    m.link = Some(LinkMark::auto(autolink::href_for(&u)));
                }
                push_text(&mut out, u, m);
            }
            Tok::Autolink(u) => out.push(InlineIr {
                kind: InlineKindIr::Autolink(u),
                marks,
            }),
            Tok::Emoji(n) => out.push(InlineIr {
                kind: InlineKindIr::Emoji(n),
                marks,
            }),
            Tok::Mention(n) => out.push(InlineIr {
                kind: InlineKindIr::Mention(n),
                marks,
            }),
            Tok::Hashtag(s) => out.push(InlineIr {
                kind: InlineKindIr::Hashtag(s),
                marks,
            }),
            Tok::Image {
                src,
                alt,
                title,
                scale,
                width,
                height,
            } => out.push(InlineIr {
                kind: InlineKindIr::Image {
                    src,
                    alt,
                    title,
                    scale,
                    width,
                    height,
                },
                marks,
            }),
            Tok::InlineWrap {
                name,
                attributes,
                children,
            } => out.push(InlineIr {
                kind: InlineKindIr::InlineWrap {
                    name,
                    attributes,
                    children: resolve(children, &MarkSet::plain(), opts),
                },
                marks,
            }),
            Tok::HardBreak => out.push(InlineIr {
                kind: InlineKindIr::HardBreak,
                marks: MarkSet::plain(),
            }),
        }
    }
    out
}

/// Append a text run, merging into the previous run when marks are
/// identical. Keeps the run list canonical: adjacent identical-mark runs
/// never appear side by side.
fn push_text(out: &mut Vec<InlineIr>, s: String, marks: MarkSet) {
    if s.is_empty() {
        return;
    }
    if let Some(InlineIr {
        kind: InlineKindIr::Text(prev),
        marks: prev_marks,
    }) = out.last_mut()
        && *prev_marks == marks
    {
        prev.push_str(&s);
        return;
    }
    out.push(InlineIr {
        kind: InlineKindIr::Text(s),
        marks,
    });
}
