//! Event handler tokens.
//!
//! Closures cannot be compared, so virtual nodes never compare them. Instead every
//! [`Listener`] carries a [`HandlerId`] minted when the listener is created, and
//! two listeners are equal exactly when their ids are equal. The closure itself is
//! reachable by hosts only through the handler registry once the node carrying it
//! has been patched in, and stops being reachable when the node goes away.

use alloc::rc::Rc;
use core::{
    fmt,
    hash::{Hash, Hasher},
    num::NonZeroU64,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::event::Event;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-wide unique identifier of one event handler closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HandlerId(NonZeroU64);

impl HandlerId {
    /// Mints a fresh identifier. Identifiers are never reused within a process.
    #[must_use]
    pub fn mint() -> Self {
        let raw = NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MAX))
    }

    /// Returns the raw numeric value, e.g. for hosts that store it in a DOM attribute.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Handler trait for closures reacting to an [`Event`].
///
/// Handlers are shared between the virtual tree and the registry, so they only
/// receive `&self`; mutable state belongs in state cells.
pub trait Handler: 'static {
    /// Handles one event.
    fn handle(&self, event: &Event);
}

impl<F> Handler for F
where
    F: Fn(&Event) + 'static,
{
    fn handle(&self, event: &Event) {
        self(event);
    }
}

impl_debug!(dyn Handler);

/// A handler closure together with its identity.
#[derive(Clone)]
pub struct Listener {
    id: HandlerId,
    handler: Rc<dyn Handler>,
}

impl Listener {
    /// Wraps a handler, minting a new [`HandlerId`] for it.
    pub fn new(handler: impl Handler) -> Self {
        Self {
            id: HandlerId::mint(),
            handler: Rc::new(handler),
        }
    }

    /// Returns the identifier of this listener.
    #[must_use]
    pub const fn id(&self) -> HandlerId {
        self.id
    }

    /// Invokes the handler.
    pub fn call(&self, event: &Event) {
        self.handler.handle(event);
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl Hash for Listener {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id).finish()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Listener {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}
