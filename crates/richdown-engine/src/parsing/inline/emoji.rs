use std::collections::BTreeSet;

/// Shortcodes recognized out of the box. A deliberately common subset; hosts
/// extend the table per session through [`EmojiTable::insert`].
const STANDARD_SHORTCODES: &[&str] = &[
    "100",
    "angry",
    "anguished",
    "astonished",
    "blush",
    "boom",
    "bow",
    "brain",
    "bulb",
    "cat",
    "chart_with_upwards_trend",
    "checkered_flag",
    "clap",
    "cold_sweat",
    "confetti_ball",
    "confounded",
    "confused",
    "cry",
    "crying_cat_face",
    "dizzy_face",
    "dog",
    "disappointed",
    "expressionless",
    "eyes",
    "facepalm",
    "fearful",
    "fire",
    "flushed",
    "frowning",
    "gift",
    "grimacing",
    "grin",
    "grinning",
    "hand_wave",
    "heart",
    "heart_eyes",
    "hugs",
    "hushed",
    "innocent",
    "joy",
    "kissing_heart",
    "laughing",
    "lock",
    "mag",
    "memo",
    "money_mouth_face",
    "monkey",
    "neutral_face",
    "no_mouth",
    "open_mouth",
    "partying_face",
    "pensive",
    "persevere",
    "pleading_face",
    "point_up",
    "pray",
    "question",
    "rage",
    "raised_hands",
    "relieved",
    "rocket",
    "rofl",
    "roll_eyes",
    "sweat",
    "sweat_smile",
    "scream",
    "seedling",
    "slight_frown",
    "slight_smile",
    "sleeping",
    "sleepy",
    "smile",
    "smiley",
    "smiling_imp",
    "smirk",
    "sob",
    "sparkles",
    "star",
    "star_struck",
    "stuck_out_tongue",
    "stuck_out_tongue_closed_eyes",
    "stuck_out_tongue_winking_eye",
    "sunglasses",
    "tada",
    "thinking",
    "thumbsdown",
    "thumbsup",
    "tired_face",
    "triumph",
    "unamused",
    "upside_down_face",
    "warning",
    "wave",
    "weary",
    "wink",
    "worried",
    "yum",
    "zipper_mouth_face",
];

/// Typographic shortcuts expanded to emoji shortcodes when they stand alone
/// between whitespace/line boundaries. Longest-match wins, so the table is
/// ordered by pattern length descending.
pub const TEXT_SHORTCUTS: &[(&str, &str)] = &[
    (">:-(", "angry"),
    (":-)", "slight_smile"),
    (":-(", "frowning"),
    (":-D", "smiley"),
    (":-P", "stuck_out_tongue"),
    (":-O", "open_mouth"),
    (";-)", "wink"),
    (":'(", "cry"),
    (">:(", "angry"),
    (":)", "slight_smile"),
    (":(", "frowning"),
    (":D", "smiley"),
    (":P", "stuck_out_tongue"),
    (":O", "open_mouth"),
    (":|", "neutral_face"),
    (":/", "confused"),
    (";)", "wink"),
    ("<3", "heart"),
];

/// The emoji shortcode table for one editing session.
///
/// Replaces what the original system kept as a process-wide cache: the table
/// is owned by the session's parse options, constructed with the session and
/// discarded with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiTable {
    names: BTreeSet<String>,
}

impl EmojiTable {
    pub fn standard() -> Self {
        Self {
            names: STANDARD_SHORTCODES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Register a custom shortcode (site emoji, host extensions).
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for EmojiTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Check whether `name` is a syntactically valid shortcode: ASCII
/// alphanumerics, `_`, `+`, `-`.
pub fn valid_shortcode_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'+' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_common_names() {
        let t = EmojiTable::standard();
        assert!(t.contains("slight_smile"));
        assert!(t.contains("tada"));
        assert!(!t.contains("not_an_emoji"));
    }

    #[test]
    fn custom_shortcodes_extend_the_table() {
        let mut t = EmojiTable::standard();
        assert!(!t.contains("partyparrot"));
        t.insert("partyparrot");
        assert!(t.contains("partyparrot"));
    }

    #[test]
    fn shortcut_table_is_longest_match_first() {
        for pair in TEXT_SHORTCUTS.windows(2) {
            assert!(
                pair[0].0.len() >= pair[1].0.len(),
                "{:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn shortcut_targets_are_known_shortcodes() {
        let t = EmojiTable::standard();
        for (_, name) in TEXT_SHORTCUTS {
            assert!(t.contains(name), "missing {name}");
        }
    }

    #[test]
    fn shortcode_name_validation() {
        assert!(valid_shortcode_name("slight_smile"));
        assert!(valid_shortcode_name("+1"));
        assert!(!valid_shortcode_name(""));
        assert!(!valid_shortcode_name("has space"));
    }
}
