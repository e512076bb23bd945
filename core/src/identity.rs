//! Stable identities for sibling nodes.
//!
//! The diff engine matches old and new children by identity rather than by
//! position. Unkeyed children are identified by their position and node kind, which
//! is fine for static content but turns every reorder into a remove/insert pair.
//! Children tagged with a [`Key`] are identified by that key alone, so reordering a
//! keyed list only moves nodes.
//!
//! An identity is scoped to its sibling list: the parent half of the identity is the
//! path of the parent node, which every [`Patch`](crate::Patch) carries.
//!
//! Duplicate keys are resolved deterministically according to
//! [`DuplicateKeyPolicy`] and reported as [`Ambiguity`] records, never by dropping
//! a child.

use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::fmt;

use ripple_str::Str;

use crate::vnode::{NodeKind, VNode};

/// An application supplied key for a list child.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Key {
    /// A signed integer key.
    Int(i64),
    /// An unsigned integer key, e.g. a database row id.
    Uint(u64),
    /// A string key.
    Str(Str),
}

macro_rules! impl_key_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

impl_key_from!(Int as i64: i8, i16, i32, i64);
impl_key_from!(Uint as u64: u8, u16, u32, u64);
impl_key_from!(Str as Str: &'static str, String, Str);

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::Uint(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}u"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

/// The kind component of a positional identity.
///
/// Text content is deliberately not part of it: a text node whose content changes is
/// still the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum KindTag {
    /// An element with the given tag.
    Element(Str),
    /// A text node.
    Text,
    /// A fragment.
    Fragment,
}

impl From<&NodeKind> for KindTag {
    fn from(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Element(tag) => Self::Element(tag.clone()),
            NodeKind::Text(_) => Self::Text,
            NodeKind::Fragment => Self::Fragment,
        }
    }
}

/// Identity of a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Identity {
    /// Identified by an explicit key; invariant under reordering.
    Keyed(Key),
    /// Identified by position and kind.
    Positional {
        /// Index within the sibling list.
        index: usize,
        /// Kind of the node at that index.
        kind: KindTag,
    },
    /// An earlier occurrence of a duplicated key. It is shadowed by the last
    /// occurrence and can only ever match a node at the same index.
    Shadowed {
        /// The duplicated key.
        key: Key,
        /// Index within the sibling list.
        index: usize,
    },
}

impl Identity {
    /// Returns the application key this identity was derived from, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        match self {
            Self::Keyed(key) | Self::Shadowed { key, .. } => Some(key),
            Self::Positional { .. } => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyed(key) => write!(f, "key {key}"),
            Self::Positional { index, kind } => match kind {
                KindTag::Element(tag) => write!(f, "<{tag}>#{index}"),
                KindTag::Text => write!(f, "text#{index}"),
                KindTag::Fragment => write!(f, "fragment#{index}"),
            },
            Self::Shadowed { key, index } => write!(f, "key {key} (shadowed)#{index}"),
        }
    }
}

impl From<Key> for Identity {
    fn from(key: Key) -> Self {
        Self::Keyed(key)
    }
}

/// How duplicate keys inside one sibling list are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DuplicateKeyPolicy {
    /// The last occurrence of a key keeps the keyed identity; earlier occurrences
    /// become [`Identity::Shadowed`].
    #[default]
    Shadow,
    /// The whole sibling list falls back to positional identities.
    Positional,
}

/// A duplicated key detected while resolving a sibling list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// The duplicated key.
    pub key: Key,
    /// Indices of every child carrying the key, in order.
    pub positions: Vec<usize>,
}

/// Identities resolved for one sibling list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// One identity per child, in child order; all distinct.
    pub identities: Vec<Identity>,
    /// Duplicate keys found in the list.
    pub ambiguities: Vec<Ambiguity>,
}

impl Resolved {
    /// Returns `true` when no duplicate keys were found.
    #[must_use]
    pub fn is_unambiguous(&self) -> bool {
        self.ambiguities.is_empty()
    }
}

/// Resolves the identity of every child in `children`.
///
/// The result is deterministic, so hosts that need identities for nodes they
/// received inside a `Replace` or `InsertChild` patch can call this with the same
/// policy and obtain exactly what the diff engine used.
#[must_use]
pub fn resolve_children(children: &[VNode], policy: DuplicateKeyPolicy) -> Resolved {
    let mut occurrences: BTreeMap<&Key, Vec<usize>> = BTreeMap::new();
    for (index, child) in children.iter().enumerate() {
        if let Some(key) = child.key_ref() {
            occurrences.entry(key).or_default().push(index);
        }
    }

    let ambiguities: Vec<Ambiguity> = occurrences
        .iter()
        .filter(|(_, positions)| positions.len() > 1)
        .map(|(key, positions)| Ambiguity {
            key: (*key).clone(),
            positions: positions.clone(),
        })
        .collect();

    if !ambiguities.is_empty() {
        tracing::warn!(
            duplicates = ambiguities.len(),
            ?policy,
            "duplicate keys in sibling list"
        );
    }

    let positional = policy == DuplicateKeyPolicy::Positional && !ambiguities.is_empty();

    let identities = children
        .iter()
        .enumerate()
        .map(|(index, child)| match child.key_ref() {
            Some(key) if !positional => {
                let last = occurrences
                    .get(key)
                    .and_then(|positions| positions.last().copied());
                if last == Some(index) {
                    Identity::Keyed(key.clone())
                } else {
                    Identity::Shadowed {
                        key: key.clone(),
                        index,
                    }
                }
            }
            _ => Identity::Positional {
                index,
                kind: KindTag::from(child.kind()),
            },
        })
        .collect();

    Resolved {
        identities,
        ambiguities,
    }
}
