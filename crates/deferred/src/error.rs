// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Loop, configuration, and aggregate rejection errors.

use std::fmt;

use thiserror::Error;

/// Failure while draining the event loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    /// A single drain pass ran `budget` callbacks and the queue was still
    /// non-empty. The remaining callbacks stay queued.
    #[error("microtask drain exceeded budget ({budget}); raise DEFERRED_MICROTASK_BUDGET or break the reaction cycle")]
    MicrotaskBudgetExceeded { budget: usize },
}

/// Invalid configuration input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}: expected a non-negative integer or `unlimited`")]
    InvalidBudget { var: &'static str, value: String },
}

/// Rejection reason of [`Future::any`](crate::Future::any) when every input
/// rejected. `errors` is in the order the rejections happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError<E> {
    pub errors: Vec<E>,
}

impl<E> AggregateError<E> {
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<E> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} futures were rejected", self.errors.len())
    }
}

impl<E: fmt::Debug> std::error::Error for AggregateError<E> {}
