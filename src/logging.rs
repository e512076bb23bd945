//! Logging setup.
//!
//! Every crate of the workspace logs through `tracing`. Applications that do not
//! install their own subscriber can call [`init`] once at startup.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the filter directives, e.g. `ripple=debug`.
pub const LOG_ENV: &str = "RIPPLE_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

static INSTALLED: Once = Once::new();

/// Installs a formatting subscriber filtered by [`LOG_ENV`] (idempotent).
///
/// Falls back to `info` when the variable is unset or invalid. Does nothing if
/// another global subscriber is already installed.
pub fn init() {
    INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
        let result = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_filter(filter))
            .try_init();

        if result.is_err() {
            eprintln!("ripple: a global tracing subscriber is already installed");
        }
    });
}
