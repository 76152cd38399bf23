use serde::Serialize;

/// The kinds of character-level marks a run of inline content can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkKind {
    Bold,
    Italic,
    Code,
    Strikethrough,
    Link,
}

/// A link mark attached to one or more inline nodes.
///
/// `auto` distinguishes synthetic links (bare `www.`/scheme URLs detected by
/// the scanner) from authored `[text](url)` links. Auto links are revalidated
/// on reconciliation and offer no separate text to preserve when removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMark {
    pub href: String,
    pub title: Option<String>,
    pub auto: bool,
}

impl LinkMark {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            auto: false,
        }
    }

    pub fn auto(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            auto: true,
        }
    }
}

/// The set of marks active on a single inline node.
///
/// Marks are well-nested in the document tree even though the source Markdown
/// permits ambiguous overlapping emphasis; the inline scanner resolves
/// ambiguity before marks ever reach a `MarkSet`.
///
/// Invariant: `code` excludes every other mark. [`MarkSet::add`] and
/// [`MarkSet::sanitize`] enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: Option<LinkMark>,
}

impl MarkSet {
    /// A mark set with nothing active.
    pub fn plain() -> Self {
        Self::default()
    }

    /// A mark set carrying only the code mark.
    pub fn code() -> Self {
        Self {
            code: true,
            ..Self::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.code && !self.strikethrough && self.link.is_none()
    }

    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Code => self.code,
            MarkKind::Strikethrough => self.strikethrough,
            MarkKind::Link => self.link.is_some(),
        }
    }

    /// Activate a mark. Adding `code` clears everything else; adding any
    /// other mark onto a code run is a no-op (code wins).
    pub fn add(&mut self, kind: MarkKind) {
        if kind == MarkKind::Code {
            *self = Self::code();
            return;
        }
        if self.code {
            return;
        }
        match kind {
            MarkKind::Bold => self.bold = true,
            MarkKind::Italic => self.italic = true,
            MarkKind::Strikethrough => self.strikethrough = true,
            MarkKind::Link => {} // links need a target; see SetLink
            MarkKind::Code => unreachable!(),
        }
    }

    pub fn remove(&mut self, kind: MarkKind) {
        match kind {
            MarkKind::Bold => self.bold = false,
            MarkKind::Italic => self.italic = false,
            MarkKind::Code => self.code = false,
            MarkKind::Strikethrough => self.strikethrough = false,
            MarkKind::Link => self.link = None,
        }
    }

    /// Restore the code-exclusivity invariant after bulk edits.
    pub fn sanitize(&mut self) {
        if self.code {
            self.bold = false;
            self.italic = false;
            self.strikethrough = false;
            self.link = None;
        }
    }

    /// The same set without any link mark.
    pub fn without_link(&self) -> Self {
        Self {
            link: None,
            ..self.clone()
        }
    }
}
