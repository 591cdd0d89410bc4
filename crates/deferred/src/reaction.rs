// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Chaining: `then`, `on_fulfilled`, `catch`, `passthrough`, `finally`.
//!
//! Each call stores one reaction record on the source future. A record
//! owns both branch handlers plus the resolver of the downstream future it
//! created; settlement consumes it through exactly one branch. The
//! downstream never points back at the source.
//!
//! Dispatch:
//! - source pending: the record waits in the reaction list and runs during
//!   the microtask that settles the source;
//! - source already settled: the matching handler runs synchronously,
//!   inside the chaining call. The downstream's own settlement still goes
//!   through the microtask queue.
//!
//! A handler's `Ok` resolves the downstream and its `Err` rejects it.

use tracing::trace;

use crate::future::{Future, Resolver, State};

/// A registered continuation. Consumed once, through one branch.
pub(crate) trait Reaction<T, E> {
    fn fulfilled(self: Box<Self>, value: T);
    fn rejected(self: Box<Self>, reason: E);
}

struct Then<F, R, U, E> {
    on_fulfilled: F,
    on_rejected: R,
    downstream: Resolver<U, E>,
}

impl<T, U, E, F, R> Reaction<T, E> for Then<F, R, U, E>
where
    U: Clone + 'static,
    E: Clone + 'static,
    F: FnOnce(T) -> Result<U, E>,
    R: FnOnce(E) -> Result<U, E>,
{
    fn fulfilled(self: Box<Self>, value: T) {
        let Then {
            on_fulfilled,
            downstream,
            ..
        } = *self;
        downstream.settle(on_fulfilled(value));
    }

    fn rejected(self: Box<Self>, reason: E) {
        let Then {
            on_rejected,
            downstream,
            ..
        } = *self;
        downstream.settle(on_rejected(reason));
    }
}

/// Runs one callback on either branch, then forwards the original outcome.
struct Finally<F, T, E> {
    on_finally: F,
    downstream: Resolver<T, E>,
}

impl<T, E, F> Reaction<T, E> for Finally<F, T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    F: FnOnce() -> Result<(), E>,
{
    fn fulfilled(self: Box<Self>, value: T) {
        let Finally {
            on_finally,
            downstream,
        } = *self;
        match on_finally() {
            Ok(()) => downstream.resolve(value),
            Err(thrown) => downstream.reject(thrown),
        }
    }

    fn rejected(self: Box<Self>, reason: E) {
        let Finally {
            on_finally,
            downstream,
        } = *self;
        match on_finally() {
            Ok(()) => downstream.reject(reason),
            Err(thrown) => downstream.reject(thrown),
        }
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Attach both branches. The returned future settles with whatever the
    /// branch that runs returns.
    pub fn then<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, E> + 'static,
        R: FnOnce(E) -> Result<U, E> + 'static,
    {
        let (downstream, resolver) = Future::with_resolvers(self.event_loop());
        self.register(Box::new(Then {
            on_fulfilled,
            on_rejected,
            downstream: resolver,
        }));
        downstream
    }

    /// Fulfilled branch only; rejections pass through unchanged.
    pub fn on_fulfilled<U, F>(&self, on_fulfilled: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, E> + 'static,
    {
        self.then(on_fulfilled, Err)
    }

    /// Rejected branch only; values pass through unchanged.
    pub fn catch<R>(&self, on_rejected: R) -> Future<T, E>
    where
        R: FnOnce(E) -> Result<T, E> + 'static,
    {
        self.then(Ok, on_rejected)
    }

    /// `then` with no handlers: identity on values, rethrow on reasons.
    pub fn passthrough(&self) -> Future<T, E> {
        self.then(Ok, Err)
    }

    /// Run `on_finally` once the source settles, either way.
    ///
    /// The returned future carries the source's outcome, unless
    /// `on_finally` fails, in which case it rejects with that error.
    pub fn finally<F>(&self, on_finally: F) -> Future<T, E>
    where
        F: FnOnce() -> Result<(), E> + 'static,
    {
        let (downstream, resolver) = Future::with_resolvers(self.event_loop());
        self.register(Box::new(Finally {
            on_finally,
            downstream: resolver,
        }));
        downstream
    }

    fn register(&self, reaction: Box<dyn Reaction<T, E>>) {
        let settled = {
            let mut state = self.core.state.borrow_mut();
            match &mut *state {
                State::Pending { reactions } => {
                    reactions.push(reaction);
                    trace!(
                        future = self.core.id,
                        reactions = reactions.len(),
                        "reaction registered"
                    );
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Rejected(reason) => Err(reason.clone()),
            }
        };

        trace!(future = self.core.id, "source settled, dispatching inline");
        match settled {
            Ok(value) => reaction.fulfilled(value),
            Err(reason) => reaction.rejected(reason),
        }
    }
}
