//! Patch vocabulary and the host contract.
//!
//! A diff produces an ordered list of [`Patch`]es. Each patch addresses its target
//! node by a [`NodePath`] of child indices from the root, interpreted against the
//! host tree *as it stands after every earlier patch of the same list*. Hosts apply
//! patches strictly in order and never need to re-index.

use alloc::{boxed::Box, rc::Rc, vec::Vec};
use core::{cell::RefCell, fmt, ops::Deref};

use ripple_str::Str;
use smallvec::SmallVec;

use crate::{
    handler::{HandlerId, Listener},
    identity::Identity,
    vnode::{PropValue, VNode},
};

/// Location of a node as child indices from the root. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(SmallVec<[usize; 8]>);

impl NodePath {
    /// The root path.
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Returns the path of this node's child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.0.push(index);
        path
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Deref for NodePath {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<&[usize]> for NodePath {
    fn from(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }
}

impl<const N: usize> From<[usize; N]> for NodePath {
    fn from(indices: [usize; N]) -> Self {
        Self(indices.into_iter().collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Property changes of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropDelta {
    /// Properties present only in the new node.
    pub added: Vec<(Str, PropValue)>,
    /// Names of properties present only in the old node.
    pub removed: Vec<Str>,
    /// Properties present in both with a different value; carries the new value.
    pub changed: Vec<(Str, PropValue)>,
}

impl PropDelta {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// A single mutation instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PatchOp {
    /// Replace the target node and its whole subtree.
    Replace(VNode),
    /// Update properties of the target node.
    UpdateProps(PropDelta),
    /// Insert `node` as a child of the target at `index`.
    InsertChild {
        /// Position in the child list after insertion.
        index: usize,
        /// Identity of the inserted child among its new siblings.
        identity: Identity,
        /// The inserted subtree.
        node: VNode,
    },
    /// Remove the child of the target with the given identity.
    RemoveChild(Identity),
    /// Detach the child with the given identity and re-insert it at `to`.
    MoveChild {
        /// Identity of the moved child.
        identity: Identity,
        /// Position in the child list after the move.
        to: usize,
    },
    /// Replace the content of the target text node.
    SetText(Str),
}

impl PatchOp {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::UpdateProps(_) => "update-props",
            Self::InsertChild { .. } => "insert-child",
            Self::RemoveChild(_) => "remove-child",
            Self::MoveChild { .. } => "move-child",
            Self::SetText(_) => "set-text",
        }
    }

    /// Returns `true` for insert, remove and move operations.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InsertChild { .. } | Self::RemoveChild(_) | Self::MoveChild { .. }
        )
    }
}

/// A [`PatchOp`] addressed to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Patch {
    /// The node the operation applies to.
    pub path: NodePath,
    /// The operation.
    pub op: PatchOp,
}

impl Patch {
    /// Creates a patch.
    #[must_use]
    pub const fn new(path: NodePath, op: PatchOp) -> Self {
        Self { path, op }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.op.name())?;
        match &self.op {
            PatchOp::InsertChild {
                index, identity, ..
            } => write!(f, " {identity} at {index}"),
            PatchOp::RemoveChild(identity) => write!(f, " {identity}"),
            PatchOp::MoveChild { identity, to } => write!(f, " {identity} to {to}"),
            PatchOp::SetText(text) => write!(f, " {text:?}"),
            PatchOp::Replace(_) | PatchOp::UpdateProps(_) => Ok(()),
        }
    }
}

/// The contract a host binder implements to receive the output of a render cycle.
///
/// Within one cycle the scheduler first reports retired handlers, then newly
/// registered ones, then every patch in order.
pub trait PatchSink {
    /// Applies one patch.
    fn apply_patch(&mut self, patch: Patch);

    /// A listener became reachable through `id`.
    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        let _ = (id, listener);
    }

    /// `id` is no longer dispatchable; hosts should unbind it.
    fn handler_retired(&mut self, id: HandlerId) {
        let _ = id;
    }
}

impl PatchSink for Vec<Patch> {
    fn apply_patch(&mut self, patch: Patch) {
        self.push(patch);
    }
}

impl<S: PatchSink + ?Sized> PatchSink for &mut S {
    fn apply_patch(&mut self, patch: Patch) {
        (**self).apply_patch(patch);
    }

    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        (**self).handler_registered(id, listener);
    }

    fn handler_retired(&mut self, id: HandlerId) {
        (**self).handler_retired(id);
    }
}

impl<S: PatchSink + ?Sized> PatchSink for Box<S> {
    fn apply_patch(&mut self, patch: Patch) {
        (**self).apply_patch(patch);
    }

    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        (**self).handler_registered(id, listener);
    }

    fn handler_retired(&mut self, id: HandlerId) {
        (**self).handler_retired(id);
    }
}

/// Shared sinks, e.g. a host kept by the application and also handed to the
/// scheduler. The cell is borrowed only for the duration of each call.
impl<S: PatchSink + ?Sized> PatchSink for Rc<RefCell<S>> {
    fn apply_patch(&mut self, patch: Patch) {
        self.borrow_mut().apply_patch(patch);
    }

    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        self.borrow_mut().handler_registered(id, listener);
    }

    fn handler_retired(&mut self, id: HandlerId) {
        self.borrow_mut().handler_retired(id);
    }
}

impl_debug!(dyn PatchSink);
