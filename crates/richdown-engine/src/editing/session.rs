//! The per-session context object: one live document, its parse options,
//! a version counter, and the bookkeeping for in-flight resolution.

use std::collections::BTreeMap;

use crate::dom::Document;
use crate::editing::commands::{self, Cmd};
use crate::editing::patch::Patch;
use crate::error::EditError;
use crate::options::ParseOptions;
use crate::parsing::parse_with_options;
use crate::resolve::{
    self, PendingResolutions, RequestId, ResolutionRequest, ResolvedEntity, UrlPreview,
};
use crate::serialize::serialize;

/// One editing session over one document.
///
/// All tree mutations happen on the caller's single logical thread; parse
/// and serialize are synchronous and pure. The only asynchronous boundary
/// is resolution: [`EditSession::begin_resolution`] hands out a batched
/// request, the host resolves it on its own time, and the `apply_*` methods
/// patch the live tree — idempotently, in any order, and only while the
/// request is still live. Switching documents cancels everything pending so
/// a late result can never land on a tree it wasn't collected from.
pub struct EditSession {
    doc: Document,
    options: ParseOptions,
    version: u64,
    pending: PendingResolutions,
}

impl EditSession {
    pub fn new(markdown: &str) -> Self {
        Self::with_options(markdown, ParseOptions::default())
    }

    pub fn with_options(markdown: &str, options: ParseOptions) -> Self {
        let doc = parse_with_options(markdown, &options);
        Self {
            doc,
            options,
            version: 0,
            pending: PendingResolutions::default(),
        }
    }

    /// Create a session from raw bytes, validating UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(text))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Serialize the current tree to Markdown. Pull-based: computed on
    /// demand, nothing is kept in sync while editing.
    pub fn to_markdown(&self) -> String {
        serialize(&self.doc)
    }

    /// Replace the document with a full reparse of new source (e.g. the
    /// user toggled back from the raw-Markdown view, or switched drafts).
    /// Cancels all in-flight resolution for the old tree.
    pub fn reparse(&mut self, markdown: &str) {
        self.pending.cancel_all();
        self.doc = parse_with_options(markdown, &self.options);
        self.version += 1;
    }

    /// Apply one edit command atomically.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let changed = commands::apply_command(&mut self.doc, &cmd)?;
        self.version += 1;
        Ok(Patch {
            changed,
            version: self.version,
        })
    }

    /// Batch every unresolved candidate into a resolution request, or
    /// `None` when the tree has nothing left to resolve.
    pub fn begin_resolution(&mut self) -> Option<ResolutionRequest> {
        let req = resolve::collect_request(&self.doc)?;
        self.pending.register(req.id);
        Some(req)
    }

    /// Apply name-resolution results. Returns how many nodes were patched;
    /// zero for a cancelled request or when nothing matched.
    pub fn apply_names(
        &mut self,
        id: RequestId,
        results: &BTreeMap<String, ResolvedEntity>,
    ) -> usize {
        if !self.pending.is_live(id) {
            log::debug!("dropping stale name resolution result");
            return 0;
        }
        let patched = resolve::apply_names(&mut self.doc, results);
        if patched > 0 {
            self.version += 1;
        }
        patched
    }

    /// Apply upload-URL results. Same liveness and idempotence rules as
    /// [`EditSession::apply_names`].
    pub fn apply_uploads(&mut self, id: RequestId, results: &BTreeMap<String, String>) -> usize {
        if !self.pending.is_live(id) {
            log::debug!("dropping stale upload resolution result");
            return 0;
        }
        let patched = resolve::apply_uploads(&mut self.doc, results);
        if patched > 0 {
            self.version += 1;
        }
        patched
    }

    /// Apply a onebox preview for one URL. Returns whether a node was
    /// upgraded.
    pub fn apply_preview(&mut self, id: RequestId, url: &str, preview: &UrlPreview) -> bool {
        if !self.pending.is_live(id) {
            log::debug!("dropping stale preview for {url}");
            return false;
        }
        let upgraded = resolve::apply_preview(&mut self.doc, url, preview);
        if upgraded {
            self.version += 1;
        }
        upgraded
    }

    /// Cancel all in-flight resolution requests (document switch,
    /// navigation away). Late results for cancelled requests are dropped
    /// silently.
    pub fn cancel_pending(&mut self) {
        self.pending.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_rejects_invalid_utf8() {
        assert!(EditSession::from_bytes(&[0xFF, 0xFE]).is_err());
        assert!(EditSession::from_bytes(b"# ok").is_ok());
    }

    #[test]
    fn versions_bump_on_edits_only() {
        let mut session = EditSession::new("hello");
        assert_eq!(session.version(), 0);
        let block = session.document().children(session.document().root())[0];
        let patch = session
            .apply(Cmd::InsertText {
                block,
                at: 5,
                text: " world".to_string(),
            })
            .unwrap();
        assert_eq!(patch.version, 1);
        assert_eq!(session.version(), 1);
        assert_eq!(patch.changed, vec![block]);
    }

    #[test]
    fn cancelled_resolution_results_are_dropped() {
        let mut session = EditSession::new("ping @sam");
        let req = session.begin_resolution().expect("has candidates");

        session.cancel_pending();

        let mut results = BTreeMap::new();
        results.insert(
            "sam".to_string(),
            ResolvedEntity::Mention {
                username: "Sam".to_string(),
            },
        );
        assert_eq!(session.apply_names(req.id, &results), 0);
    }

    #[test]
    fn reparse_cancels_pending_resolution() {
        let mut session = EditSession::new("ping @sam");
        let req = session.begin_resolution().expect("has candidates");

        session.reparse("different content @sam");

        let mut results = BTreeMap::new();
        results.insert(
            "sam".to_string(),
            ResolvedEntity::Mention {
                username: "Sam".to_string(),
            },
        );
        assert_eq!(session.apply_names(req.id, &results), 0);
    }

    #[test]
    fn resolution_for_deleted_content_is_a_noop() {
        let mut session = EditSession::new("ping @sam");
        let req = session.begin_resolution().expect("has candidates");

        // Delete the mention before the results arrive.
        let block = session.document().children(session.document().root())[0];
        session
            .apply(Cmd::DeleteRange { block, range: 0..6 })
            .unwrap();

        let mut results = BTreeMap::new();
        results.insert(
            "sam".to_string(),
            ResolvedEntity::Mention {
                username: "Sam".to_string(),
            },
        );
        assert_eq!(session.apply_names(req.id, &results), 0);
    }

    #[test]
    fn to_markdown_is_pull_based() {
        let mut session = EditSession::new("hello");
        let block = session.document().children(session.document().root())[0];
        session
            .apply(Cmd::InsertText {
                block,
                at: 0,
                text: "well, ".to_string(),
            })
            .unwrap();
        assert_eq!(session.to_markdown(), "well, hello\n");
    }
}
