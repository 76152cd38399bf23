//! # richdown-engine
//!
//! Bidirectional Markdown ⇄ rich-document conversion: parse flat Markdown
//! into an arena-indexed document tree, edit the tree through a small
//! command API, and serialize it back to canonical Markdown. The round trip
//! is stable under no-op edits: `parse(serialize(parse(x))) == parse(x)`.
//!
//! External concerns (name resolution, upload URLs, URL previews) are
//! consumed through the narrow traits in [`resolve`]; the engine itself is
//! a pure text⇄tree transform library with no I/O.

pub mod dom;
pub mod editing;
pub mod error;
pub mod options;
pub mod parsing;
pub mod resolve;
pub mod serialize;
pub mod snapshot;

pub use dom::{Document, HashtagKind, LinkMark, MarkKind, MarkSet, NodeId, NodeKind};
pub use editing::{Cmd, EditSession, Patch};
pub use error::EditError;
pub use options::ParseOptions;
pub use parsing::inline::emoji::EmojiTable;
pub use parsing::{parse, parse_with_options};
pub use resolve::{
    NameResolver, RequestId, ResolutionRequest, ResolvedEntity, UploadResolver, UrlExpander,
    UrlPreview,
};
pub use serialize::serialize;
