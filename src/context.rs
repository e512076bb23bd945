//! The reconciliation context.
//!
//! One [`ReconciliationContext`] owns everything that outlives a single render
//! cycle: the tree each root last patched into its host, the handler registry and
//! the diagnostics. The scheduler borrows it mutably for the duration of a flush;
//! hosts use it between flushes to dispatch events.

use std::collections::HashMap;

use ripple_core::{
    Event, HandlerDelta, HandlerId, Identity, PatchSink, VNode, diff_with,
};

use crate::{
    config::Config, diagnostics::Diagnostics, error::ReconcileError, registry::HandlerRegistry,
    scheduler::RootId,
};

/// Outcome of [`ReconciliationContext::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Dispatch {
    /// The handler was called.
    Delivered,
    /// The handler is not registered; nothing happened.
    Stale,
}

impl Dispatch {
    /// Returns `true` if the handler was called.
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Explicit owner of the state shared by every render cycle.
#[derive(Debug)]
pub struct ReconciliationContext {
    config: Config,
    registry: HandlerRegistry,
    retained: HashMap<RootId, VNode>,
    diagnostics: Diagnostics,
}

impl Default for ReconciliationContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ReconciliationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            retained: HashMap::new(),
            diagnostics: Diagnostics::new(config.diagnostics_capacity),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the diagnostics.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the diagnostics for clearing.
    pub const fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Returns `true` if `id` can currently be dispatched.
    #[must_use]
    pub fn is_registered(&self, id: HandlerId) -> bool {
        self.registry.contains(id)
    }

    /// Number of dispatchable handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of roots whose tree is currently patched into a host.
    #[must_use]
    pub fn mounted_roots(&self) -> usize {
        self.retained.len()
    }

    /// Delivers `event` to the handler registered under `id`.
    ///
    /// A handler retired by an earlier render cycle is never called; the dispatch
    /// is counted as stale instead.
    pub fn dispatch(&mut self, id: HandlerId, event: &Event) -> Dispatch {
        let Some(listener) = self.registry.get(id).cloned() else {
            self.diagnostics.record(ReconcileError::HandlerNotFound(id));
            return Dispatch::Stale;
        };
        tracing::trace!(%id, event = event.name(), "dispatching");
        listener.call(event);
        Dispatch::Delivered
    }

    /// Diffs `tree` against the tree retained for `root`, synchronizes handlers and
    /// hands everything to `sink`. Returns the number of patches applied.
    pub(crate) fn reconcile(&mut self, root: RootId, tree: VNode, sink: &mut dyn PatchSink) -> usize {
        let old = self.retained.get(&root);
        let outcome = diff_with(old, &tree, &self.config.diff_options());
        let handlers = HandlerDelta::between(old, Some(&tree));

        for (path, ambiguity) in outcome.ambiguities {
            self.diagnostics.record(ReconcileError::StructuralAmbiguity {
                path,
                identity: Identity::Keyed(ambiguity.key),
                count: ambiguity.positions.len(),
            });
        }

        for id in handlers.retired {
            self.registry.retire(id);
            sink.handler_retired(id);
        }
        for listener in &handlers.registered {
            self.registry.register(listener);
            sink.handler_registered(listener.id(), listener);
        }

        let count = outcome.patches.len();
        tracing::trace!(%root, patches = count, "applying patches");
        for patch in outcome.patches {
            sink.apply_patch(patch);
        }

        self.retained.insert(root, tree);
        self.diagnostics.count_cycle(count);
        count
    }

    /// Forgets `root`: retires its handlers and drops its retained tree.
    pub(crate) fn teardown(&mut self, root: RootId, mut sink: Option<&mut dyn PatchSink>) {
        let Some(old) = self.retained.remove(&root) else {
            return;
        };
        for id in HandlerDelta::between(Some(&old), None).retired {
            self.registry.retire(id);
            if let Some(sink) = sink.as_deref_mut() {
                sink.handler_retired(id);
            }
        }
        self.diagnostics.count_teardown();
        tracing::debug!(%root, "root torn down");
    }
}
