use std::fmt;

use nami::{Binding, Signal, watcher::Context};

/// An owned, observable value.
///
/// Clones share the same cell. Every write stores the value and then notifies the
/// watchers synchronously; equal values are not filtered out.
#[derive(Clone)]
pub struct State<T: 'static> {
    cell: Binding<T>,
}

impl<T: Clone + Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> State<T> {
    /// Creates a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            cell: Binding::container(value),
        }
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn read(&self) -> T {
        self.cell.get()
    }

    /// Calls `f` with the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.get())
    }

    /// Stores `value` and notifies watchers.
    pub fn write(&self, value: T) {
        self.cell.set(value);
    }

    /// Stores `value`, notifies watchers and returns the previous value.
    pub fn replace(&self, value: T) -> T {
        let previous = self.cell.get();
        self.cell.set(value);
        previous
    }

    /// Applies `f` to a copy of the value, stores the result and notifies watchers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.cell.get();
        f(&mut value);
        self.cell.set(value);
    }

    /// Returns a binding reading and writing this cell.
    #[must_use]
    pub fn binding(&self) -> Binding<T> {
        self.cell.clone()
    }
}

impl<T: Clone + 'static> From<State<T>> for Binding<T> {
    fn from(state: State<T>) -> Self {
        state.cell
    }
}

impl<T: Clone + 'static> Signal for State<T> {
    type Output = T;
    type Guard = <Binding<T> as Signal>::Guard;

    fn get(&self) -> T {
        self.cell.get()
    }

    fn watch(&self, watcher: impl Fn(Context<T>) + 'static) -> Self::Guard {
        self.cell.watch(watcher)
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.cell.get())
            .finish()
    }
}
