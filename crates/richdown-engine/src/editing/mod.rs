//! # Editing core
//!
//! The mutation side of the engine, structured around four pieces:
//!
//! 1. **Session** (`session`): the per-editing-session context object — one
//!    live [`Document`](crate::dom::Document), its parse options, a version
//!    counter, and the registry of in-flight resolution requests. Replaces
//!    any notion of process-global state: constructed with the session,
//!    discarded with it.
//! 2. **Commands** (`commands`): every edit is a [`Cmd`] applied atomically
//!    through [`EditSession::apply`], yielding a [`Patch`] with the changed
//!    nodes and new version.
//! 3. **Reconciliation** (`reconcile`): after each mutation the affected
//!    block is restored to canonical form — adjacent identical runs merged,
//!    stale synthetic links dropped, code-mark exclusivity enforced.
//! 4. **Resolution plumbing**: the session brokers batched requests to the
//!    host's resolvers and applies late-arriving patches only while their
//!    request is live.
//!
//! Mark behavior at boundaries follows the editor conventions this engine
//! is built for: typing against the edge of a link does not extend the
//! link, toggling a mark twice is the identity, and converting a selection
//! to code drops every other mark on it.

pub mod commands;
pub mod patch;
pub mod reconcile;
pub mod session;

pub use commands::Cmd;
pub use patch::Patch;
pub use session::EditSession;
