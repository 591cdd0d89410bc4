// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Future core: status, stored outcome, reaction list, settle-once.
//!
//! Settlement is two-step. `Resolver::resolve`/`reject` only check the
//! status and queue a microtask; the microtask re-checks, writes the
//! outcome, and hands it to every reaction registered so far, in
//! registration order. A `then` issued right after construction is
//! therefore always registered before anything is delivered, even when the
//! executor settles synchronously.
//!
//! Settled values are stored and delivered as-is. A future passed as a
//! fulfillment value is not adopted.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::event_loop::EventLoop;
use crate::reaction::Reaction;

/// Lifecycle of a future. Leaves `Pending` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Fulfilled,
    Rejected,
}

impl Status {
    pub fn is_settled(self) -> bool {
        !matches!(self, Status::Pending)
    }

    pub fn is_fulfilled(self) -> bool {
        matches!(self, Status::Fulfilled)
    }

    pub fn is_rejected(self) -> bool {
        matches!(self, Status::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Fulfilled => "fulfilled",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of a future. Also the per-input record produced by
/// [`Future::all_settled`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T, E> {
    Fulfilled { value: T },
    Rejected { reason: E },
}

impl<T, E> Settled<T, E> {
    pub fn status(&self) -> Status {
        match self {
            Settled::Fulfilled { .. } => Status::Fulfilled,
            Settled::Rejected { .. } => Status::Rejected,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Settled::Fulfilled { value } => Some(value),
            Settled::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&E> {
        match self {
            Settled::Fulfilled { .. } => None,
            Settled::Rejected { reason } => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settled::Fulfilled { value } => Ok(value),
            Settled::Rejected { reason } => Err(reason),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settled<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settled::Fulfilled { value },
            Err(reason) => Settled::Rejected { reason },
        }
    }
}

pub(crate) enum State<T, E> {
    /// Reactions wait here, in registration order, until settlement.
    Pending { reactions: Vec<Box<dyn Reaction<T, E>>> },
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> State<T, E> {
    fn status(&self) -> Status {
        match self {
            State::Pending { .. } => Status::Pending,
            State::Fulfilled(_) => Status::Fulfilled,
            State::Rejected(_) => Status::Rejected,
        }
    }
}

pub(crate) struct Core<T, E> {
    pub(crate) id: u64,
    pub(crate) event_loop: EventLoop,
    pub(crate) state: RefCell<State<T, E>>,
}

impl<T, E> Core<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    fn status(&self) -> Status {
        self.state.borrow().status()
    }

    /// Deferred half of settlement. Runs from the microtask queue.
    fn settle(&self, outcome: Settled<T, E>) {
        let reactions = {
            let mut state = self.state.borrow_mut();
            let current = state.status();
            let State::Pending { reactions } = &mut *state else {
                debug!(
                    future = self.id,
                    requested = %outcome.status(),
                    current = %current,
                    "settle request ignored, future already settled"
                );
                return;
            };
            let reactions = std::mem::take(reactions);
            *state = match &outcome {
                Settled::Fulfilled { value } => State::Fulfilled(value.clone()),
                Settled::Rejected { reason } => State::Rejected(reason.clone()),
            };
            reactions
        };

        debug!(
            future = self.id,
            status = %outcome.status(),
            reactions = reactions.len(),
            "future settled"
        );
        if reactions.is_empty() && outcome.status().is_rejected() {
            debug!(future = self.id, "rejected with no reactions registered");
        }

        // State borrow is released: reactions may call `then` on this future.
        match outcome {
            Settled::Fulfilled { value } => {
                for reaction in reactions {
                    reaction.fulfilled(value.clone());
                }
            }
            Settled::Rejected { reason } => {
                for reaction in reactions {
                    reaction.rejected(reason.clone());
                }
            }
        }
    }
}

/// Settlement entry points for one future.
///
/// Cloneable so it can be moved into timers or other callbacks. Every call
/// after the future has left `Pending` is a no-op; when two requests race
/// inside the same turn the first one queued wins.
pub struct Resolver<T, E> {
    core: Rc<Core<T, E>>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub fn resolve(&self, value: T) {
        self.request(Settled::Fulfilled { value });
    }

    pub fn reject(&self, reason: E) {
        self.request(Settled::Rejected { reason });
    }

    /// `Ok` resolves, `Err` rejects.
    pub fn settle(&self, result: Result<T, E>) {
        self.request(result.into());
    }

    pub fn is_pending(&self) -> bool {
        self.core.status() == Status::Pending
    }

    fn request(&self, outcome: Settled<T, E>) {
        if !self.is_pending() {
            return;
        }
        let core = self.core.clone();
        self.core
            .event_loop
            .queue_microtask(move || core.settle(outcome));
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("future", &self.core.id)
            .field("status", &self.core.state.borrow().status())
            .finish()
    }
}

/// A value or error available later.
///
/// Cloning yields another handle to the same future.
pub struct Future<T, E> {
    pub(crate) core: Rc<Core<T, E>>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Run `executor` synchronously with the new future's resolver.
    ///
    /// An `Err` from the executor rejects the future, unless a settlement
    /// was already requested.
    pub fn new<F>(event_loop: &EventLoop, executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (future, resolver) = Self::with_resolvers(event_loop);
        if let Err(reason) = executor(resolver.clone()) {
            debug!(future = future.core.id, "executor failed");
            resolver.reject(reason);
        }
        future
    }

    /// A pending future and its resolver, for settling from outside an
    /// executor.
    pub fn with_resolvers(event_loop: &EventLoop) -> (Self, Resolver<T, E>) {
        let core = Rc::new(Core {
            id: event_loop.next_future_id(),
            event_loop: event_loop.clone(),
            state: RefCell::new(State::Pending {
                reactions: Vec::new(),
            }),
        });
        let resolver = Resolver { core: core.clone() };
        (Self { core }, resolver)
    }

    /// Fulfills with `value` once `delay_ms` virtual ms have passed.
    pub fn from_timeout(event_loop: &EventLoop, delay_ms: u64, value: T) -> Self {
        let (future, resolver) = Self::with_resolvers(event_loop);
        event_loop.set_timeout(delay_ms, move || resolver.resolve(value));
        future
    }

    /// Rejects with `reason` once `delay_ms` virtual ms have passed.
    pub fn reject_after(event_loop: &EventLoop, delay_ms: u64, reason: E) -> Self {
        let (future, resolver) = Self::with_resolvers(event_loop);
        event_loop.set_timeout(delay_ms, move || resolver.reject(reason));
        future
    }

    pub fn status(&self) -> Status {
        self.core.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    /// Fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<T> {
        match &*self.core.state.borrow() {
            State::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Rejection reason, if rejected.
    pub fn reason(&self) -> Option<E> {
        match &*self.core.state.borrow() {
            State::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Settled<T, E>> {
        match &*self.core.state.borrow() {
            State::Pending { .. } => None,
            State::Fulfilled(value) => Some(Settled::Fulfilled {
                value: value.clone(),
            }),
            State::Rejected(reason) => Some(Settled::Rejected {
                reason: reason.clone(),
            }),
        }
    }
}

impl<T, E> Future<T, E> {
    /// Per-loop sequence number, for logs and debugging.
    pub fn id(&self) -> u64 {
        self.core.id
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.core.event_loop
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.state.borrow();
        let mut dbg = f.debug_struct("Future");
        dbg.field("id", &self.core.id).field("status", &state.status());
        if let State::Pending { reactions } = &*state {
            dbg.field("reactions", &reactions.len());
        }
        dbg.finish()
    }
}
