//! Core data model of the Ripple reconciliation engine.
//!
//! This crate holds everything that is pure data or pure computation:
//!
//! - [`VNode`] - the declarative output tree produced by render-roots
//! - [`identity`] - stable sibling identities derived from position or keys
//! - [`diff`] - the tree diff producing an ordered [`Patch`] list
//! - [`patch`] - the patch vocabulary and the [`PatchSink`] host contract
//! - [`handler`] and [`event`] - event handler tokens delivered through the registry
//!
//! State cells live in `ripple-reactive`, scheduling in the `ripple` crate.

#![no_std]

extern crate alloc;

#[macro_use]
mod macros;
pub mod diff;
pub mod event;
pub mod handler;
pub mod identity;
pub mod patch;
pub mod view;
pub mod vnode;

#[cfg(test)]
mod tests;

pub use diff::{DiffOptions, DiffOutcome, HandlerDelta, diff, diff_with};
pub use event::{Event, EventDetail};
pub use handler::{Handler, HandlerId, Listener};
pub use identity::{
    Ambiguity, DuplicateKeyPolicy, Identity, Key, KindTag, Resolved, resolve_children,
};
pub use patch::{NodePath, Patch, PatchOp, PatchSink, PropDelta};
pub use ripple_str::Str;
pub use view::Renderable;
pub use vnode::{NodeKind, PropValue, Props, VNode};
