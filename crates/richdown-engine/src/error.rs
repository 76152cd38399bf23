use crate::dom::NodeId;

/// Errors from the mutation API. Parsing and serialization are total and
/// never produce these: malformed input degrades to plain text, and the
/// serializer fails closed by emitting raw content. Only commands that
/// reference nodes or ranges can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not attached to the document")]
    DetachedNode(NodeId),
    #[error("node {0:?} does not carry inline content")]
    NotInlineContainer(NodeId),
    #[error("range {start}..{end} is out of bounds (inline length {len})")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("link marks need a target; use SetLink instead of ToggleMark")]
    LinkNeedsTarget,
    #[error("attribute {key:?} is not supported on this node")]
    UnsupportedAttribute { key: String },
    #[error("invalid value {value:?} for attribute {key:?}")]
    InvalidAttributeValue { key: String, value: String },
    #[error("an image grid cannot be nested inside another grid")]
    NestedGrid,
    #[error("node cannot be placed under this parent")]
    InvalidPlacement,
    #[error("the document root cannot be removed")]
    RemoveRoot,
}
