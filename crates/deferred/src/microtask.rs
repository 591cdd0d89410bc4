// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Microtask queue.
//!
//! Plain FIFO of zero-argument callbacks. Single-threaded: the owning
//! [`EventLoop`](crate::EventLoop) pops one entry at a time and runs it with
//! no borrow held, so callbacks may enqueue more work into the same pass.

use std::collections::VecDeque;
use std::fmt;

/// A deferred zero-argument callback.
pub type Microtask = Box<dyn FnOnce()>;

pub struct MicrotaskQueue {
    queue: VecDeque<Microtask>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Append to the tail.
    pub fn push(&mut self, task: Microtask) {
        self.queue.push_back(task);
    }

    /// Remove the head.
    pub fn pop(&mut self) -> Option<Microtask> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for MicrotaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.queue.len())
            .finish()
    }
}
