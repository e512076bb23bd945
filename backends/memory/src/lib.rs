//! In-memory reference host.
//!
//! [`MemoryHost`] keeps a tree of [`HostNode`]s and mutates it exactly as described
//! by the patches it receives. Applying `diff(old, new)` to a host holding `old`
//! leaves it holding `new`, which is what the property tests of this crate check.

mod error;
mod html;
mod node;

use std::collections::BTreeMap;

use ripple_core::{
    DuplicateKeyPolicy, HandlerId, Listener, NodeKind, NodePath, Patch, PatchOp, PatchSink,
    VNode,
};

pub use error::HostError;
pub use node::{HostChild, HostNode, NodeId};

/// A host tree living in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    policy: DuplicateKeyPolicy,
    root: Option<HostNode>,
    next_node: usize,
    handlers: BTreeMap<HandlerId, Listener>,
    applied: Vec<Patch>,
    errors: Vec<HostError>,
}

impl MemoryHost {
    /// Creates an empty host resolving duplicate keys with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty host resolving duplicate keys with `policy`. It must match
    /// the policy of the context producing the patches.
    #[must_use]
    pub fn with_policy(policy: DuplicateKeyPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Applies one patch.
    ///
    /// # Errors
    ///
    /// Returns a [`HostError`] if the patch does not fit the current tree. The tree
    /// is left unchanged in that case.
    pub fn apply(&mut self, patch: Patch) -> Result<(), HostError> {
        tracing::trace!(%patch, "applying patch");
        self.applied.push(patch.clone());
        let Patch { path, op } = patch;

        match op {
            PatchOp::Replace(node) => {
                let built = self.build(&node);
                if path.is_root() {
                    self.root = Some(built);
                } else {
                    *self.node_mut(&path)? = built;
                }
            }
            PatchOp::UpdateProps(delta) => {
                let props = self.node_mut(&path)?.props_mut();
                for name in &delta.removed {
                    props.remove(name);
                }
                for (name, value) in delta.added.into_iter().chain(delta.changed) {
                    props.insert(name, value);
                }
            }
            PatchOp::InsertChild {
                index,
                identity,
                node,
            } => {
                let node = self.build(&node);
                let parent = self.node_mut(&path)?;
                let len = parent.children().len();
                if index > len {
                    return Err(HostError::OutOfBounds { path, index, len });
                }
                parent.children_mut().insert(index, HostChild { identity, node });
            }
            PatchOp::RemoveChild(identity) => {
                let parent = self.node_mut(&path)?;
                let Some(position) = parent.position_of(&identity) else {
                    return Err(HostError::MissingChild { path, identity });
                };
                parent.children_mut().remove(position);
            }
            PatchOp::MoveChild { identity, to } => {
                let parent = self.node_mut(&path)?;
                let Some(from) = parent.position_of(&identity) else {
                    return Err(HostError::MissingChild { path, identity });
                };
                let len = parent.children().len();
                if to >= len {
                    return Err(HostError::OutOfBounds {
                        path,
                        index: to,
                        len,
                    });
                }
                let child = parent.children_mut().remove(from);
                parent.children_mut().insert(to, child);
            }
            PatchOp::SetText(text) => {
                let node = self.node_mut(&path)?;
                match node.kind_mut() {
                    NodeKind::Text(content) => *content = text,
                    _ => return Err(HostError::NotText(path)),
                }
            }
        }
        Ok(())
    }

    /// Applies patches in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`HostError`].
    pub fn apply_all(&mut self, patches: impl IntoIterator<Item = Patch>) -> Result<(), HostError> {
        patches.into_iter().try_for_each(|patch| self.apply(patch))
    }

    /// Returns the root node, if mounted.
    #[must_use]
    pub const fn root(&self) -> Option<&HostNode> {
        self.root.as_ref()
    }

    /// Returns the node at `path`.
    #[must_use]
    pub fn node_at(&self, path: &[usize]) -> Option<&HostNode> {
        path.iter().try_fold(self.root.as_ref()?, |node, &index| {
            node.children().get(index).map(|child| &child.node)
        })
    }

    /// Reads the host tree back as a virtual tree.
    #[must_use]
    pub fn to_vnode(&self) -> Option<VNode> {
        self.root.as_ref().map(HostNode::to_vnode)
    }

    /// Serializes the tree as markup. Fragments are flattened and listeners are
    /// not rendered.
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        if let Some(root) = &self.root {
            html::write_node(root, &mut out);
        }
        out
    }

    /// Returns the handler bound for `event` on the node at `path`, if it is still
    /// bound.
    #[must_use]
    pub fn handler_at(&self, path: &[usize], event: &str) -> Option<HandlerId> {
        let node = self.node_at(path)?;
        let id = node
            .props()
            .values()
            .filter_map(|value| match value {
                ripple_core::PropValue::EventHandler(name, listener) if name == event => {
                    Some(listener.id())
                }
                _ => None,
            })
            .next()?;
        self.is_bound(id).then_some(id)
    }

    /// Returns `true` if the host was told that `id` is registered and not yet retired.
    #[must_use]
    pub fn is_bound(&self, id: HandlerId) -> bool {
        self.handlers.contains_key(&id)
    }

    /// Number of bound handlers.
    #[must_use]
    pub fn bound_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Every patch received so far, in order.
    #[must_use]
    pub fn applied(&self) -> &[Patch] {
        &self.applied
    }

    /// Takes the received patches, leaving the log empty.
    pub fn take_applied(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.applied)
    }

    /// Errors met by patches received through [`PatchSink`].
    #[must_use]
    pub fn errors(&self) -> &[HostError] {
        &self.errors
    }

    fn build(&mut self, node: &VNode) -> HostNode {
        HostNode::build(node, self.policy, &mut self.next_node)
    }

    fn node_mut(&mut self, path: &NodePath) -> Result<&mut HostNode, HostError> {
        let mut node = self.root.as_mut().ok_or(HostError::Unmounted)?;
        for &index in path.iter() {
            node = match node.children_mut().get_mut(index) {
                Some(child) => &mut child.node,
                None => return Err(HostError::MissingNode(path.clone())),
            };
        }
        Ok(node)
    }
}

impl PatchSink for MemoryHost {
    fn apply_patch(&mut self, patch: Patch) {
        if let Err(error) = self.apply(patch) {
            tracing::error!(%error, "patch rejected by memory host");
            self.errors.push(error);
        }
    }

    fn handler_registered(&mut self, id: HandlerId, listener: &Listener) {
        self.handlers.insert(id, listener.clone());
    }

    fn handler_retired(&mut self, id: HandlerId) {
        self.handlers.remove(&id);
    }
}
