//! State cells and change propagation, built on [`nami`].
//!
//! A cell is a [`nami::Binding`]. Writing it stores the value and then calls every
//! watcher synchronously. That is all a write does: watchers installed by a
//! render-root merely mark the root dirty, and rendering happens later at the
//! scheduler's coalescing point.
//!
//! - [`State`] is the owned flavor: one component creates it and hands out
//!   [`Binding`]s to it.
//! - [`Binding`] is the referenced flavor, a read/write handle into a cell owned
//!   elsewhere. `Binding::constant` discards writes; `Binding::mapping` projects a
//!   sub-value.
//! - [`ObservableObject`] groups named [`Published`] fields behind one notification
//!   per external mutation.
//!
//! Every `watch` returns a guard; dropping it unsubscribes.

mod object;
mod state;

pub use nami;
pub use nami::{
    Binding, Signal,
    watcher::{BoxWatcherGuard, Context, WatcherGuard},
};
pub use object::{ObservableObject, Published};
pub use state::State;
