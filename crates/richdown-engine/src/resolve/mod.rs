//! # External collaborator boundary
//!
//! Mentions, hashtags, upload references and URL previews are resolved by
//! the host application, off the critical edit path. The engine's side of
//! the contract:
//!
//! - [`collect_request`] batches every unresolved candidate in the tree
//!   into a [`ResolutionRequest`] tagged with a fresh [`RequestId`];
//! - the host performs lookups however it likes (the [`NameResolver`],
//!   [`UploadResolver`] and [`UrlExpander`] traits are the narrow
//!   interfaces) and hands results back to the session;
//! - result application is idempotent and order-independent, patching the
//!   live tree in place; a result for content that no longer exists is a
//!   no-op, and a result for a cancelled request is dropped silently.
//!
//! Cancellation is generation-based: switching documents invalidates every
//! outstanding request id at once.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use uuid::Uuid;

use crate::dom::{Document, HashtagKind, NodeKind};

/// Identifies one outstanding resolution round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// What a candidate name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntity {
    Mention { username: String },
    Category { slug: String },
    Tag { slug: String },
}

/// Best-effort preview for a URL (onebox expansion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPreview {
    pub title: String,
    pub description: Option<String>,
}

/// Batched, case-insensitive name lookup. Keys in the returned map are
/// lowercase candidate names.
pub trait NameResolver {
    fn resolve_names(&self, candidates: &BTreeSet<String>) -> BTreeMap<String, ResolvedEntity>;
}

/// Maps opaque `upload://` references to display URLs.
pub trait UploadResolver {
    fn resolve_uploads(&self, refs: &BTreeSet<String>) -> BTreeMap<String, String>;
}

/// Expands a URL into a rich preview. Failures return `None` and leave the
/// URL as plain text.
pub trait UrlExpander {
    fn expand_url(&self, url: &str) -> Option<UrlPreview>;
}

/// One batched resolution request, covering everything unresolved in the
/// document at collection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub id: RequestId,
    pub mentions: BTreeSet<String>,
    pub hashtags: BTreeSet<String>,
    pub uploads: BTreeSet<String>,
    pub urls: BTreeSet<String>,
}

impl ResolutionRequest {
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
            && self.hashtags.is_empty()
            && self.uploads.is_empty()
            && self.urls.is_empty()
    }
}

/// Outstanding request ids for one session. Dropping the set cancels
/// everything; late applications check membership and no-op.
#[derive(Debug, Default)]
pub(crate) struct PendingResolutions {
    live: HashSet<RequestId>,
}

impl PendingResolutions {
    pub(crate) fn register(&mut self, id: RequestId) {
        self.live.insert(id);
    }

    pub(crate) fn is_live(&self, id: RequestId) -> bool {
        self.live.contains(&id)
    }

    pub(crate) fn cancel_all(&mut self) {
        self.live.clear();
    }
}

/// Gather unresolved candidates from the live tree. Returns `None` when
/// there is nothing to resolve.
pub(crate) fn collect_request(doc: &Document) -> Option<ResolutionRequest> {
    let mut req = ResolutionRequest {
        id: RequestId::fresh(),
        mentions: BTreeSet::new(),
        hashtags: BTreeSet::new(),
        uploads: BTreeSet::new(),
        urls: BTreeSet::new(),
    };
    for n in doc.descendants(doc.root()) {
        match doc.kind(n) {
            NodeKind::Mention {
                username,
                resolved: false,
            } => {
                req.mentions.insert(username.to_lowercase());
            }
            NodeKind::Hashtag { slug, kind: None } => {
                req.hashtags.insert(slug.to_lowercase());
            }
            NodeKind::Image {
                src,
                resolved_src: None,
                ..
            } if src.starts_with("upload://") => {
                req.uploads.insert(src.clone());
            }
            NodeKind::Autolink { url } => {
                req.urls.insert(url.clone());
            }
            NodeKind::Text { .. } => {
                if let Some(link) = &doc.marks(n).link {
                    if link.auto {
                        req.urls.insert(link.href.clone());
                    }
                }
            }
            _ => {}
        }
    }
    (!req.is_empty()).then_some(req)
}

/// Upgrade matching unresolved mentions/hashtags. Lookup is
/// case-insensitive; re-application is a no-op.
pub(crate) fn apply_names(
    doc: &mut Document,
    results: &BTreeMap<String, ResolvedEntity>,
) -> usize {
    let mut patched = 0;
    for n in doc.descendants(doc.root()) {
        match doc.kind(n).clone() {
            NodeKind::Mention {
                username,
                resolved: false,
            } => {
                if let Some(ResolvedEntity::Mention { username: canon }) =
                    results.get(&username.to_lowercase())
                {
                    *doc.kind_mut(n) = NodeKind::Mention {
                        username: canon.clone(),
                        resolved: true,
                    };
                    patched += 1;
                }
            }
            NodeKind::Hashtag { slug, kind: None } => {
                let entity = results.get(&slug.to_lowercase());
                let kind = match entity {
                    Some(ResolvedEntity::Category { .. }) => Some(HashtagKind::Category),
                    Some(ResolvedEntity::Tag { .. }) => Some(HashtagKind::Tag),
                    _ => None,
                };
                if kind.is_some() {
                    *doc.kind_mut(n) = NodeKind::Hashtag { slug, kind };
                    patched += 1;
                }
            }
            _ => {}
        }
    }
    patched
}

/// Fill in display URLs for `upload://` images. `src` keeps the opaque
/// reference so serialization round-trips.
pub(crate) fn apply_uploads(doc: &mut Document, results: &BTreeMap<String, String>) -> usize {
    let mut patched = 0;
    for n in doc.descendants(doc.root()) {
        if let NodeKind::Image {
            src,
            resolved_src: resolved @ None,
            ..
        } = doc.kind_mut(n)
        {
            if let Some(url) = results.get(src.as_str()) {
                *resolved = Some(url.clone());
                patched += 1;
            }
        }
    }
    patched
}

/// Upgrade a URL to an inline onebox. Only an `autolink` node or an
/// auto-linked run whose text is the URL itself qualifies; anything else
/// ignores the preview (there is authored text to preserve). Returns
/// whether a node was upgraded.
pub(crate) fn apply_preview(doc: &mut Document, url: &str, preview: &UrlPreview) -> bool {
    for n in doc.descendants(doc.root()) {
        // Auto-linked runs have no authored text distinct from the URL, so
        // href equality is the whole check.
        let upgrade = match doc.kind(n) {
            NodeKind::Autolink { url: u } => u == url,
            NodeKind::Text { .. } => doc
                .marks(n)
                .link
                .as_ref()
                .is_some_and(|l| l.auto && l.href == url),
            _ => false,
        };
        if upgrade {
            *doc.kind_mut(n) = NodeKind::InlineOnebox {
                url: url.to_string(),
                title: preview.title.clone(),
            };
            doc.marks_mut(n).link = None;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse;

    #[test]
    fn collects_unresolved_candidates() {
        let doc = parse("hi @Sam_One see #dev and <https://x.test> plus ![p](upload://abc)");
        let req = collect_request(&doc).expect("candidates exist");
        assert!(req.mentions.contains("sam_one"));
        assert!(req.hashtags.contains("dev"));
        assert!(req.uploads.contains("upload://abc"));
        assert!(req.urls.contains("https://x.test"));
    }

    #[test]
    fn nothing_to_resolve_yields_no_request() {
        let doc = parse("plain text only");
        assert!(collect_request(&doc).is_none());
    }

    #[test]
    fn name_application_is_case_insensitive_and_idempotent() {
        let mut doc = parse("ping @SAM");
        let mut results = BTreeMap::new();
        results.insert(
            "sam".to_string(),
            ResolvedEntity::Mention {
                username: "Sam".to_string(),
            },
        );
        assert_eq!(apply_names(&mut doc, &results), 1);
        // Second application finds nothing unresolved.
        assert_eq!(apply_names(&mut doc, &results), 0);

        let para = doc.children(doc.root())[0];
        let mention = doc.children(para)[1];
        assert_eq!(
            doc.kind(mention),
            &NodeKind::Mention {
                username: "Sam".to_string(),
                resolved: true
            }
        );
    }

    #[test]
    fn unknown_names_stay_unresolved() {
        let mut doc = parse("ping @ghost");
        assert_eq!(apply_names(&mut doc, &BTreeMap::new()), 0);
        let para = doc.children(doc.root())[0];
        let mention = doc.children(para)[1];
        assert!(matches!(
            doc.kind(mention),
            NodeKind::Mention { resolved: false, .. }
        ));
    }

    #[test]
    fn upload_resolution_keeps_src() {
        let mut doc = parse("![p](upload://abc)");
        let mut results = BTreeMap::new();
        results.insert(
            "upload://abc".to_string(),
            "https://cdn.test/abc.png".to_string(),
        );
        assert_eq!(apply_uploads(&mut doc, &results), 1);
        let para = doc.children(doc.root())[0];
        let img = doc.children(para)[0];
        let NodeKind::Image {
            src, resolved_src, ..
        } = doc.kind(img)
        else {
            panic!("expected image");
        };
        assert_eq!(src, "upload://abc");
        assert_eq!(resolved_src.as_deref(), Some("https://cdn.test/abc.png"));
    }

    #[test]
    fn preview_upgrades_bare_url_run() {
        let mut doc = parse("www.example.com");
        let preview = UrlPreview {
            title: "Example".to_string(),
            description: None,
        };
        assert!(apply_preview(&mut doc, "http://www.example.com", &preview));
        let para = doc.children(doc.root())[0];
        assert!(matches!(
            doc.kind(doc.children(para)[0]),
            NodeKind::InlineOnebox { .. }
        ));
        // Re-applying finds nothing to upgrade.
        assert!(!apply_preview(&mut doc, "http://www.example.com", &preview));
    }

    #[test]
    fn preview_never_touches_authored_links() {
        let mut doc = parse("[click](https://example.com)");
        let preview = UrlPreview {
            title: "Example".to_string(),
            description: None,
        };
        assert!(!apply_preview(&mut doc, "https://example.com", &preview));
    }
}
