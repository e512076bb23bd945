//! The render scheduler.
//!
//! State writes never render. A cell watched by a root only marks the root dirty;
//! the actual rebuild happens when the host calls [`Scheduler::flush`], the
//! coalescing point. Any number of writes between two flushes costs one render
//! cycle per dirty root.
//!
//! Per root the scheduler tracks a [`RenderState`]:
//!
//! ```text
//! Clean --write--> Dirty --flush--> Rendering --patched--> Clean
//!                    ^                  |
//!                    +---write during---+
//!                        rendering
//! ```
//!
//! A root invalidated while it renders goes back to `Dirty` and is rendered again in
//! the next pass of the same flush, up to [`Config::max_passes`](crate::Config).
//!
//! The queue is never borrowed while calling into application code (renderables,
//! sinks, watchers, handlers), so all of them may write state freely.

use std::{
    any::Any,
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    mem,
    rc::{Rc, Weak},
};

use ripple_core::{PatchSink, Renderable};
use ripple_reactive::{Signal, State};

use crate::context::ReconciliationContext;

/// Identifier of a mounted root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(u64);

impl RootId {
    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root#{}", self.0)
    }
}

/// Render state of a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// The host shows the current tree.
    Clean,
    /// A watched cell changed since the last render.
    Dirty,
    /// The root is being rebuilt and patched.
    Rendering,
}

/// Summary of one [`Scheduler::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Passes over the dirty roots.
    pub passes: usize,
    /// Render cycles run.
    pub cycles: usize,
    /// Patches handed to sinks.
    pub patches: usize,
    /// Roots torn down.
    pub teardowns: usize,
    /// Roots left dirty because the pass bound was reached.
    pub remaining: usize,
}

impl FlushReport {
    /// Returns `true` if the flush did nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cycles == 0 && self.teardowns == 0
    }
}

type FlushRequest = Rc<dyn Fn()>;

struct RootEntry {
    renderable: Weak<dyn Renderable>,
    // Taken out while the root renders.
    sink: Option<Box<dyn PatchSink>>,
    state: RenderState,
    redirtied: bool,
    unmounting: bool,
    // Watcher guards of observed signals; dropping them unsubscribes the root.
    guards: Vec<Box<dyn Any>>,
}

impl RootEntry {
    fn doomed(&self) -> bool {
        self.unmounting || self.renderable.strong_count() == 0
    }
}

#[derive(Default)]
struct Queue {
    roots: BTreeMap<RootId, RootEntry>,
    next_id: u64,
    flushing: bool,
    flush_requested: bool,
    on_flush_request: Option<FlushRequest>,
    reentrant: u64,
}

impl Queue {
    /// Returns the hook to call if this is the first request since the last flush.
    fn request_flush(&mut self) -> Option<FlushRequest> {
        if self.flushing || self.flush_requested {
            return None;
        }
        self.flush_requested = true;
        self.on_flush_request.clone()
    }

    fn invalidate(&mut self, root: RootId) -> Option<FlushRequest> {
        let entry = self.roots.get_mut(&root)?;
        match entry.state {
            RenderState::Clean => entry.state = RenderState::Dirty,
            RenderState::Dirty => return None,
            RenderState::Rendering => {
                if entry.redirtied {
                    return None;
                }
                entry.redirtied = true;
                self.reentrant += 1;
                tracing::trace!(%root, "invalidated while rendering");
            }
        }
        self.request_flush()
    }

    fn dirty_count(&self) -> usize {
        self.roots
            .values()
            .filter(|entry| entry.state == RenderState::Dirty && !entry.doomed())
            .count()
    }
}

fn call(request: Option<FlushRequest>) {
    if let Some(request) = request {
        request();
    }
}

fn invalidate(queue: &Weak<RefCell<Queue>>, root: RootId) {
    let Some(queue) = queue.upgrade() else {
        return;
    };
    let request = queue.borrow_mut().invalidate(root);
    call(request);
}

/// Coalesces invalidations and drives render cycles.
///
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<Queue>>,
}

impl Scheduler {
    /// Creates a scheduler without roots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts a render-root.
    ///
    /// The root starts [`Dirty`](RenderState::Dirty); its first tree is built and
    /// patched into `sink` at the next flush. The scheduler only keeps a weak
    /// reference to `renderable`; the returned handle owns it, and dropping the
    /// handle tears the root down at the next flush.
    #[must_use = "dropping the handle unmounts the root"]
    pub fn mount<R: Renderable>(&self, renderable: Rc<R>, sink: impl PatchSink + 'static) -> RootHandle {
        let weak: Weak<dyn Renderable> = Rc::downgrade(&renderable) as Weak<dyn Renderable>;
        let (id, request) = {
            let mut queue = self.queue.borrow_mut();
            let id = RootId(queue.next_id);
            queue.next_id += 1;
            queue.roots.insert(
                id,
                RootEntry {
                    renderable: weak,
                    sink: Some(Box::new(sink)),
                    state: RenderState::Dirty,
                    redirtied: false,
                    unmounting: false,
                    guards: Vec::new(),
                },
            );
            (id, queue.request_flush())
        };
        tracing::debug!(root = %id, "root mounted");
        call(request);

        RootHandle {
            id,
            _renderable: renderable,
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Installs the hook called on the first invalidation after a flush. Hosts
    /// typically queue a microtask or an idle callback that calls [`flush`](Self::flush).
    pub fn set_flush_request(&self, request: impl Fn() + 'static) {
        self.queue.borrow_mut().on_flush_request = Some(Rc::new(request));
    }

    /// Removes the flush request hook.
    pub fn clear_flush_request(&self) {
        self.queue.borrow_mut().on_flush_request = None;
    }

    /// Returns the render state of `root`, or `None` once it was torn down.
    #[must_use]
    pub fn state_of(&self, root: RootId) -> Option<RenderState> {
        self.queue.borrow().roots.get(&root).map(|entry| entry.state)
    }

    /// Number of roots waiting to render.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.queue.borrow().dirty_count()
    }

    /// Number of roots known to the scheduler, including those awaiting teardown.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.queue.borrow().roots.len()
    }

    /// Returns `true` if a flush would do nothing.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let queue = self.queue.borrow();
        queue
            .roots
            .values()
            .all(|entry| entry.state == RenderState::Clean && !entry.doomed())
    }

    /// Runs the coalescing point: tears down dropped roots and renders every dirty
    /// root, repeating while roots are invalidated during rendering.
    pub fn flush(&self, context: &mut ReconciliationContext) -> FlushReport {
        let max_passes = context.config().max_passes.max(1);
        let mut report = FlushReport::default();
        self.queue.borrow_mut().flushing = true;

        let span = tracing::debug_span!("flush");
        let _entered = span.enter();

        for _ in 0..max_passes {
            self.teardown_doomed(context, &mut report);
            let dirty: Vec<RootId> = {
                let queue = self.queue.borrow();
                queue
                    .roots
                    .iter()
                    .filter(|(_, entry)| entry.state == RenderState::Dirty && !entry.doomed())
                    .map(|(id, _)| *id)
                    .collect()
            };
            if dirty.is_empty() {
                break;
            }
            report.passes += 1;
            for root in dirty {
                self.render(root, context, &mut report);
            }
        }
        self.teardown_doomed(context, &mut report);

        let (reentrant, request) = {
            let mut queue = self.queue.borrow_mut();
            queue.flushing = false;
            queue.flush_requested = false;
            report.remaining = queue.dirty_count();
            let request = if report.remaining > 0 {
                queue.request_flush()
            } else {
                None
            };
            (mem::take(&mut queue.reentrant), request)
        };
        context.diagnostics_mut().count_reentrant(reentrant);

        if report.remaining > 0 {
            tracing::warn!(
                remaining = report.remaining,
                max_passes,
                "render pass limit reached with dirty roots left"
            );
        }
        tracing::debug!(
            passes = report.passes,
            cycles = report.cycles,
            patches = report.patches,
            teardowns = report.teardowns,
            "flush complete"
        );
        call(request);
        report
    }

    fn render(&self, root: RootId, context: &mut ReconciliationContext, report: &mut FlushReport) {
        let (renderable, mut sink) = {
            let mut queue = self.queue.borrow_mut();
            let Some(entry) = queue.roots.get_mut(&root) else {
                return;
            };
            if entry.state != RenderState::Dirty || entry.unmounting {
                return;
            }
            let Some(renderable) = entry.renderable.upgrade() else {
                return;
            };
            let Some(sink) = entry.sink.take() else {
                return;
            };
            entry.state = RenderState::Rendering;
            entry.redirtied = false;
            (renderable, sink)
        };

        let span = tracing::debug_span!("render", %root);
        let _entered = span.enter();

        let tree = renderable.to_vnode();
        drop(renderable);

        let unmounting = self
            .queue
            .borrow()
            .roots
            .get(&root)
            .is_none_or(RootEntry::doomed);
        if !unmounting {
            report.patches += context.reconcile(root, tree, &mut *sink);
            report.cycles += 1;
        }

        let mut queue = self.queue.borrow_mut();
        if let Some(entry) = queue.roots.get_mut(&root) {
            entry.sink = Some(sink);
            entry.state = if entry.redirtied {
                RenderState::Dirty
            } else {
                RenderState::Clean
            };
            entry.redirtied = false;
        }
    }

    fn teardown_doomed(&self, context: &mut ReconciliationContext, report: &mut FlushReport) {
        let doomed: Vec<(RootId, RootEntry)> = {
            let mut queue = self.queue.borrow_mut();
            let ids: Vec<RootId> = queue
                .roots
                .iter()
                .filter(|(_, entry)| entry.doomed())
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| queue.roots.remove(&id).map(|entry| (id, entry)))
                .collect()
        };

        // Entries hold sinks and watcher guards; they are dropped here, outside the
        // queue borrow.
        for (root, mut entry) in doomed {
            match entry.sink.as_deref_mut() {
                Some(sink) => context.teardown(root, Some(sink)),
                None => context.teardown(root, None),
            }
            report.teardowns += 1;
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.queue.try_borrow() {
            Ok(queue) => f
                .debug_struct("Scheduler")
                .field("roots", &queue.roots.len())
                .field("dirty", &queue.dirty_count())
                .field("flushing", &queue.flushing)
                .finish(),
            Err(_) => f.write_str("Scheduler { <busy> }"),
        }
    }
}

/// Owning handle of a mounted root.
///
/// Dropping the handle, or calling [`unmount`](Self::unmount), tears the root down
/// at the next flush: its handlers are retired and its watchers dropped.
pub struct RootHandle {
    id: RootId,
    _renderable: Rc<dyn Renderable>,
    queue: Weak<RefCell<Queue>>,
}

impl RootHandle {
    /// Returns the root identifier.
    #[must_use]
    pub const fn id(&self) -> RootId {
        self.id
    }

    /// Creates a state cell owned by this root: every write marks the root dirty.
    pub fn state<T: Clone + 'static>(&self, value: T) -> State<T> {
        let state = State::new(value);
        self.observe(&state);
        state
    }

    /// Marks this root dirty whenever `signal` changes.
    ///
    /// The watcher lives as long as the root.
    pub fn observe<S>(&self, signal: &S)
    where
        S: Signal,
        S::Guard: 'static,
    {
        let invalidate = self.invalidator();
        let guard = signal.watch(move |_| invalidate());
        self.keep(Box::new(guard));
    }

    /// Marks the root dirty.
    pub fn invalidate(&self) {
        invalidate(&self.queue, self.id);
    }

    /// Returns a callback marking this root dirty, for wiring custom sources.
    pub fn invalidator(&self) -> impl Fn() + 'static {
        let queue = self.queue.clone();
        let root = self.id;
        move || invalidate(&queue, root)
    }

    /// Tears the root down at the next flush.
    pub fn unmount(self) {
        drop(self);
    }

    fn keep(&self, guard: Box<dyn Any>) {
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        let mut queue = queue.borrow_mut();
        if let Some(entry) = queue.roots.get_mut(&self.id) {
            entry.guards.push(guard);
        }
    }
}

impl Drop for RootHandle {
    fn drop(&mut self) {
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        let request = {
            let Ok(mut queue) = queue.try_borrow_mut() else {
                return;
            };
            let Some(entry) = queue.roots.get_mut(&self.id) else {
                return;
            };
            entry.unmounting = true;
            queue.request_flush()
        };
        tracing::debug!(root = %self.id, "root unmount requested");
        call(request);
    }
}

impl fmt::Debug for RootHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootHandle").field("id", &self.id).finish()
    }
}
