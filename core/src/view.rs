//! The tree-builder contract.

use crate::vnode::VNode;

/// Something that can describe itself as a virtual tree.
///
/// Render-roots are registered as `Renderable`s. The scheduler calls
/// [`to_vnode`](Renderable::to_vnode) once per render cycle of the root; the
/// implementation should only read state and build the tree.
pub trait Renderable: 'static {
    /// Builds the current virtual tree.
    fn to_vnode(&self) -> VNode;
}

impl<F> Renderable for F
where
    F: Fn() -> VNode + 'static,
{
    fn to_vnode(&self) -> VNode {
        self()
    }
}

impl Renderable for VNode {
    fn to_vnode(&self) -> VNode {
        self.clone()
    }
}

impl_debug!(dyn Renderable);
