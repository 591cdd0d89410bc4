// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Event loop configuration.
//!
//! Defaults are compiled in; `DEFERRED_MICROTASK_BUDGET` overrides the
//! drain budget for hosts that want a livelock guard.

use std::env::VarError;

use crate::error::ConfigError;

/// Environment variable read by [`LoopConfig::from_env`].
pub const MICROTASK_BUDGET_VAR: &str = "DEFERRED_MICROTASK_BUDGET";

/// Tunables for an [`EventLoop`](crate::EventLoop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopConfig {
    /// Max callbacks a single drain pass may run. `None` drains until empty.
    pub microtask_budget: Option<usize>,
}

impl LoopConfig {
    /// Unlimited drain, no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap each drain pass at `budget` callbacks.
    pub fn with_budget(budget: usize) -> Self {
        Self {
            microtask_budget: Some(budget),
        }
    }

    /// Build a config from the process environment.
    ///
    /// A missing variable yields the default. `0` and `unlimited` both mean
    /// no budget. A value that is not valid unicode is rejected like any
    /// other unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(MICROTASK_BUDGET_VAR) {
            Ok(raw) => Self::from_budget_str(&raw),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidBudget {
                var: MICROTASK_BUDGET_VAR,
                value: raw.to_string_lossy().into_owned(),
            }),
        }
    }

    fn from_budget_str(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::default());
        }
        match trimmed.parse::<usize>() {
            Ok(0) => Ok(Self::default()),
            Ok(n) => Ok(Self::with_budget(n)),
            Err(_) => Err(ConfigError::InvalidBudget {
                var: MICROTASK_BUDGET_VAR,
                value: raw.to_string(),
            }),
        }
    }
}
