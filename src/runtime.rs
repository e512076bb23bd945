//! A scheduler and a context in one value.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use ripple_core::{Event, HandlerId, PatchSink, Renderable, VNode};

use crate::{
    config::Config,
    context::{Dispatch, ReconciliationContext},
    error::ConfigError,
    scheduler::{FlushReport, RootHandle, Scheduler},
};

/// Owns one [`Scheduler`] and its [`ReconciliationContext`].
///
/// Applications that do not need to hold them separately mount roots, flush and
/// dispatch events through a single `Runtime`.
#[derive(Debug, Default)]
pub struct Runtime {
    scheduler: Scheduler,
    context: ReconciliationContext,
}

impl Runtime {
    /// Creates a runtime with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            scheduler: Scheduler::new(),
            context: ReconciliationContext::new(config),
        }
    }

    /// Creates a runtime configured from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a `RIPPLE_*` variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_env().map(Self::new)
    }

    /// Mounts a render-root. See [`Scheduler::mount`].
    #[must_use = "dropping the handle unmounts the root"]
    pub fn mount<R: Renderable>(&self, renderable: Rc<R>, sink: impl PatchSink + 'static) -> RootHandle {
        self.scheduler.mount(renderable, sink)
    }

    /// Mounts a closure building the tree.
    #[must_use = "dropping the handle unmounts the root"]
    pub fn mount_fn(
        &self,
        build: impl Fn() -> VNode + 'static,
        sink: impl PatchSink + 'static,
    ) -> RootHandle {
        self.scheduler.mount(Rc::new(build), sink)
    }

    /// Runs the coalescing point.
    pub fn flush(&mut self) -> FlushReport {
        self.scheduler.flush(&mut self.context)
    }

    /// Delivers an event. See [`ReconciliationContext::dispatch`].
    pub fn dispatch(&mut self, id: HandlerId, event: &Event) -> Dispatch {
        self.context.dispatch(id, event)
    }

    /// Returns the scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the context.
    #[must_use]
    pub const fn context(&self) -> &ReconciliationContext {
        &self.context
    }

    /// Returns the context mutably.
    pub const fn context_mut(&mut self) -> &mut ReconciliationContext {
        &mut self.context
    }

    /// Flushes `runtime` on the local executor after every first invalidation.
    ///
    /// Installs the scheduler's flush request hook; each request spawns one
    /// [`FlushTask`] with [`executor_core::spawn_local`]. The native local executor
    /// is installed unless the application already installed one.
    pub fn auto_flush(runtime: &Rc<RefCell<Self>>) {
        let _ = executor_core::try_init_local_executor(native_executor::NativeExecutor::new());
        Self::auto_flush_with(runtime, |task| {
            executor_core::spawn_local(async move {
                task.run();
            })
            .detach();
        });
    }

    /// Like [`auto_flush`](Self::auto_flush), handing each [`FlushTask`] to `spawn`.
    ///
    /// If roots are already waiting, a task is spawned right away.
    pub fn auto_flush_with(runtime: &Rc<RefCell<Self>>, spawn: impl Fn(FlushTask) + 'static) {
        let spawn: Spawner = Rc::new(spawn);
        let weak = Rc::downgrade(runtime);
        let pending = {
            let runtime = runtime.borrow();
            runtime.scheduler.set_flush_request({
                let spawn = spawn.clone();
                let weak = weak.clone();
                move || spawn(FlushTask::new(weak.clone(), spawn.clone()))
            });
            !runtime.scheduler.is_idle()
        };
        tracing::debug!(pending, "auto flush installed");
        if pending {
            spawn(FlushTask::new(weak, spawn.clone()));
        }
    }
}

type Spawner = Rc<dyn Fn(FlushTask)>;

/// A deferred [`Runtime::flush`], produced by the auto flush hook.
pub struct FlushTask {
    runtime: Weak<RefCell<Runtime>>,
    spawn: Spawner,
}

impl FlushTask {
    fn new(runtime: Weak<RefCell<Runtime>>, spawn: Spawner) -> Self {
        Self { runtime, spawn }
    }

    /// Flushes the runtime.
    ///
    /// Returns `None` if the runtime was dropped, or if it is borrowed elsewhere;
    /// in the latter case the task spawns itself again.
    pub fn run(self) -> Option<FlushReport> {
        let runtime = self.runtime.upgrade()?;
        let Ok(mut borrowed) = runtime.try_borrow_mut() else {
            tracing::debug!("runtime busy, deferring flush");
            let spawn = self.spawn.clone();
            spawn(self);
            return None;
        };
        Some(borrowed.flush())
    }
}

impl fmt::Debug for FlushTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushTask")
            .field("alive", &(self.runtime.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use ripple_core::{Patch, VNode};
    use ripple_reactive::State;

    use super::{FlushTask, Runtime};

    type Tasks = Rc<RefCell<Vec<FlushTask>>>;

    fn auto_flushed(runtime: &Rc<RefCell<Runtime>>) -> Tasks {
        let tasks: Tasks = Rc::default();
        Runtime::auto_flush_with(runtime, {
            let tasks = tasks.clone();
            move |task| tasks.borrow_mut().push(task)
        });
        tasks
    }

    fn run_next(tasks: &Tasks) -> Option<crate::FlushReport> {
        let task = tasks.borrow_mut().pop()?;
        task.run()
    }

    #[test]
    fn first_invalidation_queues_one_flush() {
        let runtime = Rc::new(RefCell::new(Runtime::default()));
        let patches = Rc::new(RefCell::new(Vec::<Patch>::new()));
        let count = State::new(0);
        let root = runtime.borrow().mount_fn(
            {
                let count = count.clone();
                move || VNode::text(count.read().to_string())
            },
            patches.clone(),
        );
        root.observe(&count);

        let tasks = auto_flushed(&runtime);
        assert_eq!(tasks.borrow().len(), 1);
        assert_eq!(run_next(&tasks).map(|report| report.cycles), Some(1));
        assert_eq!(patches.borrow().len(), 1);

        count.write(1);
        count.write(2);
        assert_eq!(tasks.borrow().len(), 1);
        let report = run_next(&tasks).unwrap_or_default();
        assert_eq!(report.cycles, 1);
        assert!(tasks.borrow().is_empty());
        assert!(runtime.borrow().scheduler().is_idle());
    }

    #[test]
    fn idle_runtime_queues_nothing() {
        let runtime = Rc::new(RefCell::new(Runtime::default()));
        let tasks = auto_flushed(&runtime);
        assert!(tasks.borrow().is_empty());
    }

    #[test]
    fn busy_runtime_requeues_the_task() {
        let runtime = Rc::new(RefCell::new(Runtime::default()));
        let root = runtime.borrow().mount_fn(|| VNode::fragment(), Vec::<Patch>::new());
        let tasks = auto_flushed(&runtime);

        let guard = runtime.borrow_mut();
        assert_eq!(run_next(&tasks), None);
        assert_eq!(tasks.borrow().len(), 1);
        drop(guard);

        assert_eq!(run_next(&tasks).map(|report| report.cycles), Some(1));
        drop(root);
    }

    #[test]
    fn task_outliving_the_runtime_does_nothing() {
        let runtime = Rc::new(RefCell::new(Runtime::default()));
        let root = runtime.borrow().mount_fn(|| VNode::fragment(), Vec::<Patch>::new());
        let tasks = auto_flushed(&runtime);
        drop(root);
        drop(runtime);
        assert_eq!(run_next(&tasks), None);
    }
}
