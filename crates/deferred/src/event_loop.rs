// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host scheduler: microtask queue + timer queue + drain lifecycle.
//!
//! `EventLoop` is a cheap `Rc` handle. Every future remembers the loop it
//! was created on, so two loops never share work and a test can start from
//! a fresh, empty loop instead of resetting global state.
//!
//! Ordering contract:
//! - microtasks run FIFO, and a drain pass keeps going until the queue is
//!   empty, including work enqueued by callbacks in the same pass;
//! - no timer fires while a microtask is queued.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::LoopConfig;
use crate::error::LoopError;
use crate::microtask::MicrotaskQueue;
use crate::timer::{TimerId, TimerQueue};

/// Counters returned by [`EventLoop::run_until_idle`] and
/// [`EventLoop::advance_by`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub microtasks: usize,
    pub timers: usize,
}

#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

struct LoopInner {
    config: LoopConfig,
    microtasks: RefCell<MicrotaskQueue>,
    timers: RefCell<TimerQueue>,
    next_future_id: Cell<u64>,
}

impl EventLoop {
    /// Empty loop, clock at 0, default config.
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                config,
                microtasks: RefCell::new(MicrotaskQueue::new()),
                timers: RefCell::new(TimerQueue::new()),
                next_future_id: Cell::new(0),
            }),
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.inner.config
    }

    /// Append a callback to the microtask queue.
    pub fn queue_microtask<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        let mut queue = self.inner.microtasks.borrow_mut();
        queue.push(Box::new(f));
        trace!(pending = queue.len(), "microtask queued");
    }

    /// Schedule a timer-class callback `delay_ms` virtual ms from now.
    pub fn set_timeout<F>(&self, delay_ms: u64, f: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut timers = self.inner.timers.borrow_mut();
        let id = timers.schedule(delay_ms, Box::new(f));
        trace!(?id, delay_ms, now_ms = timers.now_ms(), "timer scheduled");
        id
    }

    /// Cancel a timer. Returns false if it already fired.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.inner.timers.borrow_mut().cancel(id)
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.timers.borrow().now_ms()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Nothing queued anywhere.
    pub fn is_idle(&self) -> bool {
        self.pending_microtasks() == 0 && self.pending_timers() == 0
    }

    /// One drain pass. Returns how many callbacks ran.
    ///
    /// The queue borrow is released before each callback runs, so callbacks
    /// may queue more microtasks; those run in this same pass.
    pub fn run_microtasks(&self) -> Result<usize, LoopError> {
        let budget = self.inner.config.microtask_budget;
        let mut ran = 0usize;
        loop {
            if let Some(budget) = budget {
                if ran >= budget && self.pending_microtasks() > 0 {
                    warn!(
                        budget,
                        pending = self.pending_microtasks(),
                        "microtask budget exhausted"
                    );
                    return Err(LoopError::MicrotaskBudgetExceeded { budget });
                }
            }
            let next = self.inner.microtasks.borrow_mut().pop();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            trace!(ran, "microtask drain complete");
        }
        Ok(ran)
    }

    /// Drain microtasks, then fire timers one at a time (earliest first),
    /// draining microtasks after each, until nothing is left.
    pub fn run_until_idle(&self) -> Result<LoopStats, LoopError> {
        let mut stats = LoopStats::default();
        loop {
            stats.microtasks += self.run_microtasks()?;
            let next = self.inner.timers.borrow_mut().pop_next();
            match next {
                Some((id, callback)) => {
                    trace!(?id, now_ms = self.now_ms(), "timer fired");
                    callback();
                    stats.timers += 1;
                }
                None => break,
            }
        }
        Ok(stats)
    }

    /// Alias for [`run_until_idle`](Self::run_until_idle).
    pub fn run(&self) -> Result<LoopStats, LoopError> {
        self.run_until_idle()
    }

    /// Fire every timer due within the next `ms` virtual milliseconds,
    /// draining microtasks around each, then park the clock at the target.
    pub fn advance_by(&self, ms: u64) -> Result<LoopStats, LoopError> {
        let target = self.now_ms().saturating_add(ms);
        let mut stats = LoopStats::default();
        loop {
            stats.microtasks += self.run_microtasks()?;
            let next = self.inner.timers.borrow_mut().pop_due(target);
            match next {
                Some((id, callback)) => {
                    trace!(?id, now_ms = self.now_ms(), "timer fired");
                    callback();
                    stats.timers += 1;
                }
                None => break,
            }
        }
        self.inner.timers.borrow_mut().advance_to(target);
        Ok(stats)
    }

    pub(crate) fn next_future_id(&self) -> u64 {
        let id = self.inner.next_future_id.get();
        self.inner.next_future_id.set(id + 1);
        id
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("config", &self.inner.config)
            .field("microtasks", &*self.inner.microtasks.borrow())
            .field("timers", &*self.inner.timers.borrow())
            .finish()
    }
}
