use ripple_core::{Identity, NodePath};

/// A patch that does not fit the host tree.
///
/// A correct diff never produces one; seeing it means the host and the engine
/// disagree about the current tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// A non-root patch arrived before the first `Replace`.
    #[error("no tree mounted")]
    Unmounted,
    /// The path leads nowhere.
    #[error("no node at {0}")]
    MissingNode(NodePath),
    /// The target has no child with the identity.
    #[error("no child {identity} under {path}")]
    MissingChild {
        /// The parent path.
        path: NodePath,
        /// The identity looked up.
        identity: Identity,
    },
    /// An insert or move index past the end of the child list.
    #[error("index {index} out of bounds under {path} with {len} children")]
    OutOfBounds {
        /// The parent path.
        path: NodePath,
        /// The rejected index.
        index: usize,
        /// Number of children at the time.
        len: usize,
    },
    /// `SetText` addressed a node that is not a text node.
    #[error("node at {0} is not a text node")]
    NotText(NodePath),
}
