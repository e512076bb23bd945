#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod scheduler;

pub use config::Config;
pub use context::{Dispatch, ReconciliationContext};
pub use diagnostics::{Counters, Diagnostics};
pub use error::{ConfigError, ReconcileError};
pub use registry::HandlerRegistry;
pub use runtime::{FlushTask, Runtime};
pub use scheduler::{FlushReport, RenderState, RootHandle, RootId, Scheduler};

#[doc(inline)]
pub use ripple_core::{
    DiffOptions, DuplicateKeyPolicy, Event, EventDetail, Handler, HandlerId, Identity, Key,
    Listener, NodeKind, NodePath, Patch, PatchOp, PatchSink, PropDelta, PropValue, Renderable,
    Str, VNode, diff, diff_with,
};
pub use ripple_core as model;
pub use ripple_reactive as reactive;
#[doc(inline)]
pub use ripple_reactive::{Binding, ObservableObject, Published, Signal, State};

pub use tracing as log;

pub mod prelude {
    //! Commonly used items.
    //!
    //! ```rust
    //! use ripple::prelude::*;
    //!
    //! let mut runtime = Runtime::default();
    //! let handle = runtime.mount_fn(|| VNode::text("hello"), Vec::<Patch>::new());
    //! assert_eq!(runtime.flush().cycles, 1);
    //! handle.unmount();
    //! ```
    pub use crate::{
        Binding, Config, Dispatch, Event, Listener, ObservableObject, Patch, PatchSink,
        Published, Renderable, RootHandle, Runtime, Signal, State, VNode,
    };
}
