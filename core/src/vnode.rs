//! The virtual node tree.
//!
//! A [`VNode`] is an immutable description of one node of the rendered output.
//! Render-roots produce a fresh tree on every cycle; the diff engine compares it
//! with the tree retained from the previous cycle.
//!
//! ```
//! use ripple_core::{Listener, VNode};
//!
//! let list = VNode::element("ul")
//!     .attr("class", "todos")
//!     .child(VNode::element("li").key(1).child(VNode::text("milk")))
//!     .child(VNode::element("li").key(2).child(VNode::text("eggs")))
//!     .child(VNode::element("button").on("click", Listener::new(|_: &ripple_core::Event| {})));
//! assert_eq!(list.child_nodes().len(), 3);
//! ```

use alloc::{collections::BTreeMap, format, vec::Vec};

use ripple_str::Str;

use crate::{
    handler::{HandlerId, Listener},
    identity::Key,
};

/// Kind of a virtual node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeKind {
    /// An element such as `div` or `li`.
    Element(Str),
    /// A text node.
    Text(Str),
    /// Pure grouping with no footprint in the host document.
    Fragment,
}

/// Value of a node property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PropValue {
    /// A string attribute, `name="value"`.
    Attribute(Str, Str),
    /// A boolean attribute such as `disabled`.
    BoolAttribute(Str, bool),
    /// An inline style declaration.
    Style(Str, Str),
    /// An event listener for the named event.
    EventHandler(Str, Listener),
}

impl PropValue {
    /// Returns the attribute, style or event name carried by the value.
    #[must_use]
    pub const fn name(&self) -> &Str {
        match self {
            Self::Attribute(name, _)
            | Self::BoolAttribute(name, _)
            | Self::Style(name, _)
            | Self::EventHandler(name, _) => name,
        }
    }

    /// Returns the listener if this is an event handler.
    #[must_use]
    pub const fn listener(&self) -> Option<&Listener> {
        match self {
            Self::EventHandler(_, listener) => Some(listener),
            _ => None,
        }
    }
}

/// Properties of a node keyed by property name.
pub type Props = BTreeMap<Str, PropValue>;

/// A node of the virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VNode {
    kind: NodeKind,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    key: Option<Key>,
    props: Props,
    children: Vec<VNode>,
}

impl VNode {
    const fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            key: None,
            props: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates an element node.
    #[must_use]
    pub fn element(tag: impl Into<Str>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into()))
    }

    /// Creates a text node.
    #[must_use]
    pub fn text(content: impl Into<Str>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    /// Creates a fragment.
    #[must_use]
    pub const fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    /// Tags the node with an explicit key, making its identity independent of its
    /// position among its siblings.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets a property under an explicit name, replacing any previous value.
    #[must_use]
    pub fn prop(mut self, name: impl Into<Str>, value: PropValue) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Sets a string attribute.
    #[must_use]
    pub fn attr(self, name: impl Into<Str>, value: impl Into<Str>) -> Self {
        let name = name.into();
        self.prop(name.clone(), PropValue::Attribute(name, value.into()))
    }

    /// Sets a boolean attribute.
    #[must_use]
    pub fn bool_attr(self, name: impl Into<Str>, value: bool) -> Self {
        let name = name.into();
        self.prop(name.clone(), PropValue::BoolAttribute(name, value))
    }

    /// Sets an inline style declaration. The property is stored under the style name.
    #[must_use]
    pub fn style(self, name: impl Into<Str>, value: impl Into<Str>) -> Self {
        let name = name.into();
        self.prop(name.clone(), PropValue::Style(name, value.into()))
    }

    /// Attaches a listener for `event`. The property is stored as `on:<event>`.
    #[must_use]
    pub fn on(self, event: impl Into<Str>, listener: Listener) -> Self {
        let event = event.into();
        let name = Str::from(format!("on:{event}"));
        self.prop(name, PropValue::EventHandler(event, listener))
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends every child produced by `children`.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the element tag, if this is an element.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Returns the text content, if this is a text node.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Returns the key, if any.
    #[must_use]
    pub const fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the properties.
    #[must_use]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the children in rendering order.
    #[must_use]
    pub fn child_nodes(&self) -> &[Self] {
        &self.children
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Returns `true` for text nodes.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Returns `true` for fragments.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::Fragment)
    }

    /// Returns `true` if `other` can be updated in place into `self`: same kind,
    /// same tag for elements. Text content does not matter.
    #[must_use]
    pub fn is_same_type(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::Element(a), NodeKind::Element(b)) => a == b,
            (NodeKind::Text(_), NodeKind::Text(_)) | (NodeKind::Fragment, NodeKind::Fragment) => {
                true
            }
            _ => false,
        }
    }

    /// Calls `visit` for every listener attached anywhere in this subtree.
    pub fn for_each_listener(&self, visit: &mut impl FnMut(&Listener)) {
        for value in self.props.values() {
            if let Some(listener) = value.listener() {
                visit(listener);
            }
        }
        for child in &self.children {
            child.for_each_listener(visit);
        }
    }

    /// Collects the ids of every listener in this subtree, depth first.
    #[must_use]
    pub fn handler_ids(&self) -> Vec<HandlerId> {
        let mut ids = Vec::new();
        self.for_each_listener(&mut |listener| ids.push(listener.id()));
        ids
    }

    /// Counts the nodes of this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::{NodeKind, PropValue, VNode};
    use crate::{event::Event, handler::Listener};

    #[test]
    fn builder_collects_props_and_children() {
        let node = VNode::element("input")
            .attr("type", "checkbox")
            .bool_attr("checked", true)
            .style("color", "red")
            .child(VNode::text("label"));

        assert_eq!(node.tag(), Some("input"));
        assert_eq!(
            node.props().get("color"),
            Some(&PropValue::Style("color".into(), "red".into()))
        );
        assert_eq!(
            node.props().get("checked"),
            Some(&PropValue::BoolAttribute("checked".into(), true))
        );
        assert_eq!(node.child_nodes()[0].text_content(), Some("label"));
        assert_eq!(node.node_count(), 2);
    }

    #[test]
    fn later_prop_with_same_name_wins() {
        let node = VNode::element("div").attr("id", "a").attr("id", "b");
        assert_eq!(node.props().len(), 1);
        assert_eq!(
            node.props().get("id"),
            Some(&PropValue::Attribute("id".into(), "b".into()))
        );
    }

    #[test]
    fn equality_compares_handlers_by_id() {
        let listener = Listener::new(|_: &Event| {});
        let a = VNode::element("button").on("click", listener.clone());
        let b = VNode::element("button").on("click", listener);
        let c = VNode::element("button").on("click", Listener::new(|_: &Event| {}));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn text_nodes_are_same_type_regardless_of_content() {
        assert!(VNode::text("a").is_same_type(&VNode::text("b")));
        assert!(!VNode::element("a").is_same_type(&VNode::element("b")));
        assert!(!VNode::fragment().is_same_type(&VNode::text("")));
        assert_eq!(VNode::fragment().kind(), &NodeKind::Fragment);
    }

    #[test]
    fn listeners_are_visited_depth_first() {
        let outer = Listener::new(|_: &Event| {});
        let inner = Listener::new(|_: &Event| {});
        let tree = VNode::element("form")
            .on("submit", outer.clone())
            .child(VNode::element("button").on("click", inner.clone()));

        assert_eq!(tree.handler_ids(), alloc::vec![outer.id(), inner.id()]);
    }
}
