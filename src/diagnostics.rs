//! Counters and recent records of recoverable conditions.

use std::collections::VecDeque;

use crate::error::ReconcileError;

/// Monotonic counters maintained by a [`ReconciliationContext`](crate::ReconciliationContext).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Counters {
    /// Render cycles completed.
    pub render_cycles: u64,
    /// Patches handed to sinks.
    pub patches_applied: u64,
    /// Sibling lists with duplicate keys.
    pub structural_ambiguities: u64,
    /// Dispatches to handlers that were not registered.
    pub stale_dispatches: u64,
    /// Roots invalidated again while they were rendering.
    pub reentrant_invalidations: u64,
    /// Roots torn down.
    pub teardowns: u64,
}

/// Counters plus a bounded ring of the most recent [`ReconcileError`]s.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    counters: Counters,
    recent: VecDeque<ReconcileError>,
    capacity: usize,
}

impl Diagnostics {
    /// Creates an empty record keeping at most `capacity` recent errors.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            counters: Counters::default(),
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a recoverable error.
    pub fn record(&mut self, error: ReconcileError) {
        match &error {
            ReconcileError::StructuralAmbiguity { .. } => {
                self.counters.structural_ambiguities += 1;
                tracing::debug!(%error, "structural ambiguity recorded");
            }
            ReconcileError::HandlerNotFound(_) => {
                self.counters.stale_dispatches += 1;
                tracing::debug!(%error, "stale dispatch ignored");
            }
        }
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(error);
    }

    pub(crate) fn count_cycle(&mut self, patches: usize) {
        self.counters.render_cycles += 1;
        self.counters.patches_applied += u64::try_from(patches).unwrap_or(u64::MAX);
    }

    pub(crate) fn count_reentrant(&mut self, invalidations: u64) {
        self.counters.reentrant_invalidations += invalidations;
    }

    pub(crate) fn count_teardown(&mut self) {
        self.counters.teardowns += 1;
    }

    /// Returns the counters.
    #[must_use]
    pub const fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Iterates over the recent errors, oldest first.
    pub fn recent(&self) -> impl ExactSizeIterator<Item = &ReconcileError> {
        self.recent.iter()
    }

    /// Forgets the recent errors. Counters are kept.
    pub fn clear_recent(&mut self) {
        self.recent.clear();
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}
