//! Diff scenarios across the whole model.

use alloc::{vec, vec::Vec};

use crate::{
    DiffOptions, DuplicateKeyPolicy, Event, HandlerDelta, Identity, Key, KindTag, Listener,
    NodePath, Patch, PatchOp, PropDelta, PropValue, VNode, diff, diff_with,
};

fn item(key: i32, label: &'static str) -> VNode {
    VNode::element("li").key(key).child(VNode::text(label))
}

fn list(items: impl IntoIterator<Item = VNode>) -> VNode {
    VNode::element("ul").children(items)
}

fn keyed(key: i32) -> Identity {
    Identity::Keyed(Key::Int(key.into()))
}

fn at(path: impl Into<NodePath>, op: PatchOp) -> Patch {
    Patch::new(path.into(), op)
}

fn root(op: PatchOp) -> Patch {
    Patch::new(NodePath::root(), op)
}

fn noop() -> Listener {
    Listener::new(|_: &Event| {})
}

// ============================================================================
// Node level
// ============================================================================

#[test]
fn first_mount_replaces_the_root() {
    let tree = list([item(1, "a")]);
    assert_eq!(diff(None, &tree), vec![root(PatchOp::Replace(tree.clone()))]);
}

#[test]
fn identical_trees_produce_no_patches() {
    let click = noop();
    let tree = VNode::element("main")
        .attr("id", "app")
        .style("color", "red")
        .child(list([item(1, "a"), item(2, "b")]))
        .child(VNode::fragment().child(VNode::text("x")).child(VNode::text("y")))
        .child(VNode::element("button").on("click", click));

    assert!(diff(Some(&tree), &tree.clone()).is_empty());
}

#[test]
fn tag_change_replaces_the_node() {
    let old = VNode::element("div").child(VNode::text("a"));
    let new = VNode::element("span").child(VNode::text("a"));
    assert_eq!(diff(Some(&old), &new), vec![root(PatchOp::Replace(new.clone()))]);
}

#[test]
fn key_change_replaces_the_node() {
    let old = item(1, "a");
    let new = item(2, "a");
    assert_eq!(diff(Some(&old), &new), vec![root(PatchOp::Replace(new.clone()))]);
}

#[test]
fn keyed_child_changing_tag_is_replaced_in_place() {
    let old = VNode::element("div").child(VNode::element("p").key(1));
    let new = VNode::element("div").child(VNode::element("h1").key(1));
    assert_eq!(
        diff(Some(&old), &new),
        vec![at([0], PatchOp::Replace(VNode::element("h1").key(1)))]
    );
}

#[test]
fn unkeyed_child_changing_tag_is_removed_and_inserted() {
    let old = VNode::element("div").child(VNode::element("p"));
    let new = VNode::element("div").child(VNode::element("h1"));
    assert_eq!(
        diff(Some(&old), &new),
        vec![
            root(PatchOp::RemoveChild(Identity::Positional {
                index: 0,
                kind: KindTag::Element("p".into()),
            })),
            root(PatchOp::InsertChild {
                index: 0,
                identity: Identity::Positional {
                    index: 0,
                    kind: KindTag::Element("h1".into()),
                },
                node: VNode::element("h1"),
            }),
        ]
    );
}

#[test]
fn text_change_sets_text() {
    let old = VNode::element("p").child(VNode::text("hello"));
    let new = VNode::element("p").child(VNode::text("world"));
    assert_eq!(
        diff(Some(&old), &new),
        vec![at([0], PatchOp::SetText("world".into()))]
    );
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn style_change_is_reported_as_changed() {
    let old = VNode::element("div").style("color", "red");
    let new = VNode::element("div").style("color", "blue");
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::UpdateProps(PropDelta {
            added: vec![],
            removed: vec![],
            changed: vec![("color".into(), PropValue::Style("color".into(), "blue".into()))],
        }))]
    );
}

#[test]
fn props_are_added_and_removed() {
    let old = VNode::element("input").attr("id", "name").bool_attr("disabled", true);
    let new = VNode::element("input").bool_attr("disabled", true).attr("title", "Name");
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::UpdateProps(PropDelta {
            added: vec![("title".into(), PropValue::Attribute("title".into(), "Name".into()))],
            removed: vec!["id".into()],
            changed: vec![],
        }))]
    );
}

#[test]
fn handler_change_is_a_prop_change() {
    let first = noop();
    let second = noop();
    let old = VNode::element("button").on("click", first.clone());
    let new = VNode::element("button").on("click", second.clone());

    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::UpdateProps(PropDelta {
            added: vec![],
            removed: vec![],
            changed: vec![(
                "on:click".into(),
                PropValue::EventHandler("click".into(), second.clone())
            )],
        }))]
    );

    let delta = HandlerDelta::between(Some(&old), Some(&new));
    assert_eq!(delta.retired, vec![first.id()]);
    assert_eq!(delta.registered, vec![second]);
}

#[test]
fn reused_listener_is_neither_patched_nor_reregistered() {
    let click = noop();
    let old = VNode::element("button").on("click", click.clone()).attr("class", "a");
    let new = VNode::element("button").on("click", click).attr("class", "b");

    let patches = diff(Some(&old), &new);
    assert_eq!(patches.len(), 1);
    let PatchOp::UpdateProps(delta) = &patches[0].op else {
        panic!("expected a prop update, got {:?}", patches[0].op);
    };
    assert!(delta.changed.iter().all(|(name, _)| name.as_str() != "on:click"));
    assert!(HandlerDelta::between(Some(&old), Some(&new)).is_empty());
}

#[test]
fn teardown_retires_every_handler() {
    let a = noop();
    let b = noop();
    let tree = VNode::element("form")
        .on("submit", a.clone())
        .child(VNode::element("button").on("click", b.clone()));

    let delta = HandlerDelta::between(Some(&tree), None);
    let mut retired = delta.retired;
    retired.sort();
    assert_eq!(retired, vec![a.id(), b.id()]);
    assert!(delta.registered.is_empty());

    let mount = HandlerDelta::between(None, Some(&tree));
    assert_eq!(mount.registered.len(), 2);
}

// ============================================================================
// Children
// ============================================================================

#[test]
fn keyed_swap_is_a_single_move() {
    let old = list([item(1, "a"), item(2, "b")]);
    let new = list([item(2, "b"), item(1, "a")]);
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::MoveChild {
            identity: keyed(2),
            to: 0,
        })]
    );
}

#[test]
fn rotation_moves_only_the_displaced_child() {
    let old = list([item(1, "a"), item(2, "b"), item(3, "c"), item(4, "d")]);
    let new = list([item(2, "b"), item(3, "c"), item(4, "d"), item(1, "a")]);
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::MoveChild {
            identity: keyed(1),
            to: 3,
        })]
    );
}

#[test]
fn reversal_moves_all_but_one() {
    let old = list((1..=5).map(|key| item(key, "x")));
    let new = list((1..=5).rev().map(|key| item(key, "x")));
    let patches = diff(Some(&old), &new);
    assert_eq!(patches.len(), 4);
    assert!(
        patches
            .iter()
            .all(|patch| matches!(patch.op, PatchOp::MoveChild { .. }))
    );
}

#[test]
fn prepend_is_a_single_insert() {
    let old = list([item(1, "a"), item(2, "b")]);
    let new = list([item(0, "z"), item(1, "a"), item(2, "b")]);
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::InsertChild {
            index: 0,
            identity: keyed(0),
            node: item(0, "z"),
        })]
    );
}

#[test]
fn removing_from_the_middle_is_a_single_remove() {
    let old = list([item(1, "a"), item(2, "b"), item(3, "c")]);
    let new = list([item(1, "a"), item(3, "c")]);
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::RemoveChild(keyed(2)))]
    );
}

#[test]
fn emission_order_is_props_removes_placements_then_children() {
    let old = list([item(1, "a"), item(2, "b"), item(3, "c")]).attr("class", "a");
    let new = list([item(3, "c!"), item(1, "a"), item(4, "d")]).attr("class", "b");

    assert_eq!(
        diff(Some(&old), &new),
        vec![
            root(PatchOp::UpdateProps(PropDelta {
                added: vec![],
                removed: vec![],
                changed: vec![("class".into(), PropValue::Attribute("class".into(), "b".into()))],
            })),
            root(PatchOp::RemoveChild(keyed(2))),
            root(PatchOp::MoveChild {
                identity: keyed(3),
                to: 0,
            }),
            root(PatchOp::InsertChild {
                index: 2,
                identity: keyed(4),
                node: item(4, "d"),
            }),
            at([0, 0], PatchOp::SetText("c!".into())),
        ]
    );
}

#[test]
fn nested_paths_follow_the_new_order() {
    let old = VNode::element("div")
        .child(VNode::element("header"))
        .child(list([item(1, "a")]));
    let new = VNode::element("div")
        .child(VNode::element("header"))
        .child(list([item(1, "b")]));
    assert_eq!(
        diff(Some(&old), &new),
        vec![at([1, 0, 0], PatchOp::SetText("b".into()))]
    );
}

#[test]
fn fragments_diff_their_children() {
    let old = VNode::fragment().child(VNode::text("a"));
    let new = VNode::fragment().child(VNode::text("a")).child(VNode::text("b"));
    assert_eq!(
        diff(Some(&old), &new),
        vec![root(PatchOp::InsertChild {
            index: 1,
            identity: Identity::Positional {
                index: 1,
                kind: KindTag::Text,
            },
            node: VNode::text("b"),
        })]
    );
}

// ============================================================================
// Duplicate keys
// ============================================================================

#[test]
fn duplicate_keys_are_shadowed_and_reported() {
    let old = list([item(1, "x")]);
    let new = list([item(1, "a"), item(1, "b")]);

    let outcome = diff_with(Some(&old), &new, &DiffOptions::default());
    assert_eq!(
        outcome.patches,
        vec![
            root(PatchOp::InsertChild {
                index: 0,
                identity: Identity::Shadowed {
                    key: Key::Int(1),
                    index: 0,
                },
                node: item(1, "a"),
            }),
            at([1, 0], PatchOp::SetText("b".into())),
        ]
    );
    assert_eq!(outcome.ambiguities.len(), 1);
    let (path, ambiguity) = &outcome.ambiguities[0];
    assert!(path.is_root());
    assert_eq!(ambiguity.key, Key::Int(1));
    assert_eq!(ambiguity.positions, vec![0, 1]);
}

#[test]
fn positional_policy_rebuilds_the_ambiguous_list() {
    let old = list([item(1, "x")]);
    let new = list([item(1, "a"), item(1, "b")]);
    let options = DiffOptions {
        duplicate_keys: DuplicateKeyPolicy::Positional,
    };

    let outcome = diff_with(Some(&old), &new, &options);
    let ops: Vec<&str> = outcome.patches.iter().map(|patch| patch.op.name()).collect();
    assert_eq!(ops, vec!["remove-child", "insert-child", "insert-child"]);
    assert_eq!(outcome.ambiguities.len(), 1);
}

#[test]
fn ambiguities_inside_mounted_subtrees_are_reported() {
    let tree = VNode::element("main").child(list([item(7, "a"), item(7, "b")]));
    let outcome = diff_with(None, &tree, &DiffOptions::default());
    assert_eq!(outcome.patches.len(), 1);
    assert_eq!(outcome.ambiguities.len(), 1);
    assert_eq!(outcome.ambiguities[0].0, NodePath::from([0]));
}

#[cfg(feature = "serde")]
#[test]
fn patches_serialize_for_remote_hosts() {
    let patch = Patch::new(
        NodePath::from([1]),
        PatchOp::MoveChild {
            identity: keyed(2),
            to: 0,
        },
    );
    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        serde_json::json!({
            "path": [1],
            "op": { "MoveChild": { "identity": { "Keyed": { "Int": 2 } }, "to": 0 } }
        })
    );

    let listener = Listener::new(|_: &Event| {});
    let prop = PropValue::EventHandler("click".into(), listener.clone());
    assert_eq!(
        serde_json::to_value(&prop).unwrap(),
        serde_json::json!({ "EventHandler": ["click", listener.id().get()] })
    );
}
