use ripple_core::{DuplicateKeyPolicy, Identity, Key, NodeKind, Props, VNode, resolve_children};

/// Identifier assigned to a host node when it is created.
///
/// Moving a node keeps its id; replacing or re-inserting it allocates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A child slot: the identity the diff engine addresses it by, and the node.
#[derive(Debug, Clone)]
pub struct HostChild {
    /// Identity among the siblings.
    pub identity: Identity,
    /// The child node.
    pub node: HostNode,
}

/// A node of the in-memory host tree.
#[derive(Debug, Clone)]
pub struct HostNode {
    id: NodeId,
    kind: NodeKind,
    key: Option<Key>,
    props: Props,
    children: Vec<HostChild>,
}

impl HostNode {
    pub(crate) fn build(node: &VNode, policy: DuplicateKeyPolicy, next: &mut usize) -> Self {
        let id = NodeId(*next);
        *next += 1;

        let children = node.child_nodes();
        let identities = resolve_children(children, policy).identities;
        let children = identities
            .into_iter()
            .zip(children)
            .map(|(identity, child)| HostChild {
                identity,
                node: Self::build(child, policy, next),
            })
            .collect();

        Self {
            id,
            kind: node.kind().clone(),
            key: node.key_ref().cloned(),
            props: node.props().clone(),
            children,
        }
    }

    /// Returns the node id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the text content of a text node.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(content) => Some(content.as_str()),
            _ => None,
        }
    }

    /// Returns the properties.
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the child slots.
    #[must_use]
    pub fn children(&self) -> &[HostChild] {
        &self.children
    }

    pub(crate) const fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub(crate) const fn props_mut(&mut self) -> &mut Props {
        &mut self.props
    }

    pub(crate) const fn children_mut(&mut self) -> &mut Vec<HostChild> {
        &mut self.children
    }

    pub(crate) fn position_of(&self, identity: &Identity) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.identity == *identity)
    }

    /// Reads the subtree back as a virtual tree.
    #[must_use]
    pub fn to_vnode(&self) -> VNode {
        let node = match &self.kind {
            NodeKind::Element(tag) => VNode::element(tag.clone()),
            NodeKind::Text(content) => VNode::text(content.clone()),
            NodeKind::Fragment => VNode::fragment(),
        };
        let node = match &self.key {
            Some(key) => node.key(key.clone()),
            None => node,
        };
        self.props
            .iter()
            .fold(node, |node, (name, value)| node.prop(name.clone(), value.clone()))
            .children(self.children.iter().map(|child| child.node.to_vnode()))
    }
}
