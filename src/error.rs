//! Error types.
//!
//! Reconciliation never fails outright: a [`ReconcileError`] describes a condition
//! the engine recovered from, recorded in [`Diagnostics`](crate::Diagnostics).

use std::num::ParseIntError;

use ripple_core::{HandlerId, Identity, NodePath};

/// A recoverable condition met while reconciling or dispatching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Several siblings carried the same key.
    #[error("{count} siblings under {path} share {identity}")]
    StructuralAmbiguity {
        /// Path of the parent node.
        path: NodePath,
        /// The duplicated identity.
        identity: Identity,
        /// Number of siblings carrying it.
        count: usize,
    },
    /// An event was dispatched to a handler that is not registered (anymore).
    #[error("no live handler registered for {0}")]
    HandlerNotFound(HandlerId),
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The value is not a non-negative integer.
    #[error("{variable}: expected a number, got {value:?}")]
    InvalidNumber {
        /// The variable read.
        variable: &'static str,
        /// The rejected value.
        value: String,
        /// The parse failure.
        #[source]
        source: ParseIntError,
    },
    /// The value must be at least one.
    #[error("{variable} must be at least 1")]
    Zero {
        /// The variable read.
        variable: &'static str,
    },
    /// The duplicate key policy is unknown.
    #[error("{variable}: unknown duplicate key policy {value:?}, expected `shadow` or `positional`")]
    UnknownPolicy {
        /// The variable read.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}
