//! Engine configuration.

use ripple_core::{DiffOptions, DuplicateKeyPolicy};

use crate::error::ConfigError;

/// Environment variable selecting the duplicate key policy (`shadow` or `positional`).
pub const DUPLICATE_KEYS_ENV: &str = "RIPPLE_DUPLICATE_KEYS";
/// Environment variable bounding the render passes of one flush.
pub const MAX_PASSES_ENV: &str = "RIPPLE_MAX_PASSES";
/// Environment variable sizing the ring of recent diagnostics.
pub const DIAGNOSTICS_CAPACITY_ENV: &str = "RIPPLE_DIAGNOSTICS_CAPACITY";

/// Default bound on render passes per flush.
pub const DEFAULT_MAX_PASSES: usize = 16;
/// Default number of diagnostics records kept.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 64;

/// Configuration of a [`ReconciliationContext`](crate::ReconciliationContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Config {
    /// How duplicate keys inside one sibling list are resolved.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Maximum number of render passes in one flush. Roots still dirty after the
    /// last pass stay dirty for the next flush.
    pub max_passes: usize,
    /// Number of recent error records kept by [`Diagnostics`](crate::Diagnostics).
    pub diagnostics_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::default(),
            max_passes: DEFAULT_MAX_PASSES,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl Config {
    /// Sets the duplicate key policy.
    #[must_use]
    pub const fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Sets the pass bound. Values below one are raised to one.
    #[must_use]
    pub const fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = if passes == 0 { 1 } else { passes };
        self
    }

    /// Sets the diagnostics ring size.
    #[must_use]
    pub const fn with_diagnostics_capacity(mut self, capacity: usize) -> Self {
        self.diagnostics_capacity = capacity;
        self
    }

    /// Options handed to the diff engine.
    #[must_use]
    pub const fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            duplicate_keys: self.duplicate_keys,
        }
    }

    /// Reads the configuration from the process environment. Unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(DUPLICATE_KEYS_ENV) {
            config.duplicate_keys = parse_policy(&value)?;
        }
        if let Some(value) = lookup(MAX_PASSES_ENV) {
            config.max_passes = parse_count(MAX_PASSES_ENV, &value)?;
            if config.max_passes == 0 {
                return Err(ConfigError::Zero {
                    variable: MAX_PASSES_ENV,
                });
            }
        }
        if let Some(value) = lookup(DIAGNOSTICS_CAPACITY_ENV) {
            config.diagnostics_capacity = parse_count(DIAGNOSTICS_CAPACITY_ENV, &value)?;
        }

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

fn parse_policy(value: &str) -> Result<DuplicateKeyPolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "shadow" => Ok(DuplicateKeyPolicy::Shadow),
        "positional" => Ok(DuplicateKeyPolicy::Positional),
        _ => Err(ConfigError::UnknownPolicy {
            variable: DUPLICATE_KEYS_ENV,
            value: value.to_owned(),
        }),
    }
}

fn parse_count(variable: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidNumber {
            variable,
            value: value.to_owned(),
            source,
        })
}
