//! Tree diffing.
//!
//! [`diff`] compares the tree retained from the previous cycle with a freshly built
//! one and returns the patches that turn the former into the latter:
//!
//! - no old tree: a single `Replace` of the root (first mount);
//! - different kind, tag or key: `Replace` of that subtree;
//! - otherwise the node is updated in place: its own property changes first, then
//!   child removals, then child inserts and moves, then the patches of every matched
//!   child, depth first in the new child order.
//!
//! Children are matched by [`Identity`]. Among the matched children, those forming
//! the longest run whose relative order is already correct stay where they are;
//! only the others are moved. Every index in the output refers to the host tree as
//! left by the preceding patches, so hosts can apply the list as is.

use alloc::{collections::BTreeMap, vec, vec::Vec};

use crate::{
    handler::{HandlerId, Listener},
    identity::{Ambiguity, DuplicateKeyPolicy, Identity, resolve_children},
    patch::{NodePath, Patch, PatchOp, PropDelta},
    vnode::{NodeKind, Props, VNode},
};

/// Knobs of the diff engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// How duplicate keys are resolved.
    pub duplicate_keys: DuplicateKeyPolicy,
}

/// Result of [`diff_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    /// Patches in application order.
    pub patches: Vec<Patch>,
    /// Duplicate keys found in the new tree, with the path of the parent node.
    pub ambiguities: Vec<(NodePath, Ambiguity)>,
}

/// Diffs two trees with default options.
#[must_use]
pub fn diff(old: Option<&VNode>, new: &VNode) -> Vec<Patch> {
    diff_with(old, new, &DiffOptions::default()).patches
}

/// Diffs two trees.
#[must_use]
pub fn diff_with(old: Option<&VNode>, new: &VNode, options: &DiffOptions) -> DiffOutcome {
    let mut differ = Differ {
        policy: options.duplicate_keys,
        outcome: DiffOutcome::default(),
    };
    let root = NodePath::root();
    match old {
        Some(old) => differ.node(&root, old, new),
        None => differ.replace(&root, new),
    }
    tracing::trace!(
        patches = differ.outcome.patches.len(),
        ambiguities = differ.outcome.ambiguities.len(),
        "diff complete"
    );
    differ.outcome
}

struct Differ {
    policy: DuplicateKeyPolicy,
    outcome: DiffOutcome,
}

impl Differ {
    fn push(&mut self, path: &NodePath, op: PatchOp) {
        self.outcome.patches.push(Patch::new(path.clone(), op));
    }

    fn node(&mut self, path: &NodePath, old: &VNode, new: &VNode) {
        if !old.is_same_type(new) || old.key_ref() != new.key_ref() {
            self.replace(path, new);
            return;
        }
        if old == new {
            return;
        }

        let delta = diff_props(old.props(), new.props());
        if !delta.is_empty() {
            self.push(path, PatchOp::UpdateProps(delta));
        }

        if let (NodeKind::Text(before), NodeKind::Text(after)) = (old.kind(), new.kind()) {
            if before != after {
                self.push(path, PatchOp::SetText(after.clone()));
            }
        }

        self.children(path, old.child_nodes(), new.child_nodes());
    }

    fn replace(&mut self, path: &NodePath, new: &VNode) {
        self.push(path, PatchOp::Replace(new.clone()));
        self.inspect_subtree(path, new);
    }

    fn children(&mut self, path: &NodePath, old: &[VNode], new: &[VNode]) {
        if old.is_empty() && new.is_empty() {
            return;
        }

        let old_ids = resolve_children(old, self.policy).identities;
        let resolved = resolve_children(new, self.policy);
        self.record(path, resolved.ambiguities);
        let new_ids = resolved.identities;

        let by_identity: BTreeMap<&Identity, usize> = old_ids
            .iter()
            .enumerate()
            .map(|(index, identity)| (identity, index))
            .collect();
        let sources: Vec<Option<usize>> = new_ids
            .iter()
            .map(|identity| by_identity.get(identity).copied())
            .collect();

        let mut kept = vec![false; old.len()];
        for &source in sources.iter().flatten() {
            kept[source] = true;
        }

        for (index, identity) in old_ids.iter().enumerate() {
            if !kept[index] {
                self.push(path, PatchOp::RemoveChild(identity.clone()));
            }
        }

        // Host order once removals are applied, and each survivor's rank in it.
        let mut current: Vec<Identity> = Vec::with_capacity(new.len());
        let mut rank = vec![0; old.len()];
        for (index, identity) in old_ids.iter().enumerate() {
            if kept[index] {
                rank[index] = current.len();
                current.push(identity.clone());
            }
        }

        let (matched, ranks): (Vec<usize>, Vec<usize>) = sources
            .iter()
            .enumerate()
            .filter_map(|(position, source)| source.map(|index| (position, rank[index])))
            .unzip();
        let mut stable = vec![false; new.len()];
        for run in longest_increasing_subsequence(&ranks) {
            stable[matched[run]] = true;
        }

        // Each remaining child is placed right after its predecessor in the new
        // order, which is already in place by the time it is reached.
        for (position, identity) in new_ids.iter().enumerate() {
            if stable[position] {
                continue;
            }
            if sources[position].is_some() {
                let Some(from) = current.iter().position(|placed| placed == identity) else {
                    continue;
                };
                let moving = current.remove(from);
                let to = insertion_point(&current, &new_ids, position);
                current.insert(to, moving);
                if from != to {
                    self.push(
                        path,
                        PatchOp::MoveChild {
                            identity: identity.clone(),
                            to,
                        },
                    );
                }
            } else {
                let to = insertion_point(&current, &new_ids, position);
                current.insert(to, identity.clone());
                self.push(
                    path,
                    PatchOp::InsertChild {
                        index: to,
                        identity: identity.clone(),
                        node: new[position].clone(),
                    },
                );
                self.inspect_subtree(&path.child(position), &new[position]);
            }
        }
        debug_assert_eq!(current, new_ids, "child placement diverged from the new order");

        for (position, source) in sources.iter().enumerate() {
            if let Some(index) = *source {
                self.node(&path.child(position), &old[index], &new[position]);
            }
        }
    }

    /// Reports duplicate keys inside a subtree that is mounted as a whole.
    fn inspect_subtree(&mut self, path: &NodePath, node: &VNode) {
        let children = node.child_nodes();
        if children.iter().any(|child| child.key_ref().is_some()) {
            let resolved = resolve_children(children, self.policy);
            self.record(path, resolved.ambiguities);
        }
        for (index, child) in children.iter().enumerate() {
            self.inspect_subtree(&path.child(index), child);
        }
    }

    fn record(&mut self, path: &NodePath, ambiguities: Vec<Ambiguity>) {
        self.outcome
            .ambiguities
            .extend(ambiguities.into_iter().map(|ambiguity| (path.clone(), ambiguity)));
    }
}

fn insertion_point(current: &[Identity], new_ids: &[Identity], position: usize) -> usize {
    position
        .checked_sub(1)
        .and_then(|previous| current.iter().position(|placed| *placed == new_ids[previous]))
        .map_or(0, |index| index + 1)
}

fn diff_props(old: &Props, new: &Props) -> PropDelta {
    let mut delta = PropDelta::default();
    for (name, value) in new {
        match old.get(name) {
            None => delta.added.push((name.clone(), value.clone())),
            Some(previous) if previous != value => delta.changed.push((name.clone(), value.clone())),
            Some(_) => {}
        }
    }
    delta.removed = old
        .keys()
        .filter(|name| !new.contains_key(*name))
        .cloned()
        .collect();
    delta
}

/// Returns the indices into `seq` of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; seq.len()];
    for (index, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&tail| seq[tail] < value);
        if slot > 0 {
            previous[index] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        run.push(index);
        cursor = previous[index];
    }
    run.reverse();
    run
}

/// Handlers whose reachability changes between two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerDelta {
    /// Handlers present in the old tree only; they must no longer be dispatchable.
    pub retired: Vec<HandlerId>,
    /// Listeners present in the new tree only.
    pub registered: Vec<Listener>,
}

impl HandlerDelta {
    /// Computes the delta between two optional trees. `new = None` describes a
    /// teardown.
    #[must_use]
    pub fn between(old: Option<&VNode>, new: Option<&VNode>) -> Self {
        let before = listeners(old);
        let after = listeners(new);
        Self {
            retired: before
                .keys()
                .filter(|id| !after.contains_key(*id))
                .copied()
                .collect(),
            registered: after
                .iter()
                .filter(|(id, _)| !before.contains_key(*id))
                .map(|(_, listener)| listener.clone())
                .collect(),
        }
    }

    /// Returns `true` if no handler is retired or registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retired.is_empty() && self.registered.is_empty()
    }
}

fn listeners(node: Option<&VNode>) -> BTreeMap<HandlerId, Listener> {
    let mut found = BTreeMap::new();
    if let Some(node) = node {
        node.for_each_listener(&mut |listener: &Listener| {
            found
                .entry(listener.id())
                .or_insert_with(|| listener.clone());
        });
    }
    found
}
