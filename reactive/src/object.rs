use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    rc::Rc,
};

use nami::{Binding, Signal, watcher::Context};
use ripple_str::Str;

/// A group of named fields that notifies once per external mutation.
///
/// Field writes inside [`mutate`](ObservableObject::mutate) are collected and
/// reported by a single notification when the outermost `mutate` returns. A field
/// write outside `mutate` is its own mutation and notifies immediately.
///
/// Watchers receive the names of the fields written, in write order.
#[derive(Clone)]
pub struct ObservableObject {
    changed: Binding<Vec<Str>>,
    batch: Rc<Batch>,
}

#[derive(Default)]
struct Batch {
    depth: Cell<usize>,
    pending: RefCell<Vec<Str>>,
}

struct Depth<'a>(&'a Cell<usize>);

impl Drop for Depth<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl Default for ObservableObject {
    fn default() -> Self {
        Self {
            changed: Binding::container(Vec::new()),
            batch: Rc::default(),
        }
    }
}

impl ObservableObject {
    /// Creates an object without fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field named `name` with an initial value.
    pub fn field<T: Clone + 'static>(&self, name: impl Into<Str>, value: T) -> Published<T> {
        Published {
            name: name.into(),
            value: Binding::container(value),
            owner: self.clone(),
        }
    }

    /// Runs `f`, batching every field write it performs into one notification.
    ///
    /// Calls may nest; only the outermost one notifies, and only if a field was
    /// written.
    pub fn mutate<R>(&self, f: impl FnOnce() -> R) -> R {
        let result = {
            self.batch.depth.set(self.batch.depth.get() + 1);
            let _depth = Depth(&self.batch.depth);
            f()
        };
        if self.batch.depth.get() == 0 {
            self.notify();
        }
        result
    }

    /// Names of the fields written by the last notified mutation, in write order.
    #[must_use]
    pub fn last_changed(&self) -> Vec<Str> {
        self.changed.get()
    }

    fn record(&self, name: &Str) {
        {
            let mut pending = self.batch.pending.borrow_mut();
            if !pending.contains(name) {
                pending.push(name.clone());
            }
        }
        if self.batch.depth.get() == 0 {
            self.notify();
        }
    }

    fn notify(&self) {
        let changed = mem::take(&mut *self.batch.pending.borrow_mut());
        if changed.is_empty() {
            return;
        }
        tracing::trace!(fields = ?changed, "observable object changed");
        self.changed.set(changed);
    }
}

impl Signal for ObservableObject {
    type Output = Vec<Str>;
    type Guard = <Binding<Vec<Str>> as Signal>::Guard;

    fn get(&self) -> Vec<Str> {
        self.last_changed()
    }

    fn watch(&self, watcher: impl Fn(Context<Vec<Str>>) + 'static) -> Self::Guard {
        self.changed.watch(watcher)
    }
}

impl fmt::Debug for ObservableObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableObject")
            .field("depth", &self.batch.depth.get())
            .field("last_changed", &self.changed.get())
            .finish_non_exhaustive()
    }
}

/// A named field of an [`ObservableObject`].
///
/// To react to a field, watch the owning object.
#[derive(Clone)]
pub struct Published<T: 'static> {
    name: Str,
    value: Binding<T>,
    owner: ObservableObject,
}

impl<T: Clone + 'static> Published<T> {
    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn read(&self) -> T {
        self.value.get()
    }

    /// Calls `f` with the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.get())
    }

    /// Stores `value` and records the write with the owning object.
    pub fn write(&self, value: T) {
        self.value.set(value);
        self.owner.record(&self.name);
    }

    /// Applies `f` to a copy of the value, stores it and records the write.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.value.get();
        f(&mut value);
        self.write(value);
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Published")
            .field("name", &self.name)
            .field("value", &self.value.get())
            .finish()
    }
}
