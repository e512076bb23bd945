use ripple_core::{NodeKind, PropValue};

use crate::node::HostNode;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn write_node(node: &HostNode, out: &mut String) {
    match node.kind() {
        NodeKind::Text(content) => escape(content, false, out),
        NodeKind::Fragment => write_children(node, out),
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            write_attributes(node, out);
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) && node.children().is_empty() {
                return;
            }
            write_children(node, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_children(node: &HostNode, out: &mut String) {
    for child in node.children() {
        write_node(&child.node, out);
    }
}

fn write_attributes(node: &HostNode, out: &mut String) {
    let mut styles = Vec::new();
    for value in node.props().values() {
        match value {
            PropValue::Attribute(name, value) => {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape(value, true, out);
                out.push('"');
            }
            PropValue::BoolAttribute(name, true) => {
                out.push(' ');
                out.push_str(name);
            }
            PropValue::Style(name, value) => styles.push((name, value)),
            PropValue::BoolAttribute(_, false) | PropValue::EventHandler(..) => {}
        }
    }
    if styles.is_empty() {
        return;
    }
    out.push_str(" style=\"");
    for (index, (name, value)) in styles.into_iter().enumerate() {
        if index > 0 {
            out.push_str("; ");
        }
        out.push_str(name);
        out.push_str(": ");
        escape(value, true, out);
    }
    out.push('"');
}

fn escape(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
