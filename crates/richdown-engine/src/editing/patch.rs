use crate::dom::NodeId;

/// Result of applying a command: the nodes whose subtrees changed and the
/// document version after the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub changed: Vec<NodeId>,
    pub version: u64,
}
