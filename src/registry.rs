//! The handler registry.
//!
//! Maps [`HandlerId`]s of listeners that are currently patched into some host to
//! their closures. The same listener may appear in several trees, so entries are
//! reference counted and only disappear when the last tree carrying them retires
//! them.

use std::collections::HashMap;

use ripple_core::{HandlerId, Listener};

#[derive(Debug)]
struct Entry {
    listener: Listener,
    mounts: usize,
}

/// Side table of dispatchable listeners.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: HashMap<HandlerId, Entry>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one mount of `listener`. Returns `true` if it was not registered.
    pub fn register(&mut self, listener: &Listener) -> bool {
        let entry = self.entries.entry(listener.id()).or_insert_with(|| Entry {
            listener: listener.clone(),
            mounts: 0,
        });
        entry.mounts += 1;
        entry.mounts == 1
    }

    /// Retires one mount of `id`. Returns `true` if the handler is no longer
    /// dispatchable afterwards.
    pub fn retire(&mut self, id: HandlerId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            tracing::debug!(%id, "retiring a handler that is not registered");
            return false;
        };
        entry.mounts -= 1;
        if entry.mounts == 0 {
            self.entries.remove(&id);
            true
        } else {
            false
        }
    }

    /// Returns the listener registered under `id`.
    #[must_use]
    pub fn get(&self, id: HandlerId) -> Option<&Listener> {
        self.entries.get(&id).map(|entry| &entry.listener)
    }

    /// Returns `true` if `id` is dispatchable.
    #[must_use]
    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of dispatchable handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
