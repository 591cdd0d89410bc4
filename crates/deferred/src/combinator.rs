// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Static constructors and aggregate combinators.
//!
//! Every combinator creates one output future and attaches a `then` pair to
//! each input. Inputs that are already settled dispatch inline, so the
//! output's settlement request can be queued before the combinator returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::error::AggregateError;
use crate::event_loop::EventLoop;
use crate::future::{Future, Settled};

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Future that fulfills with `value` on the next drain. `value` is
    /// stored as-is, even if it is itself a future.
    pub fn resolve(event_loop: &EventLoop, value: T) -> Self {
        Self::new(event_loop, move |r| {
            r.resolve(value);
            Ok(())
        })
    }

    /// Future that rejects with `reason` on the next drain.
    pub fn reject(event_loop: &EventLoop, reason: E) -> Self {
        Self::new(event_loop, move |r| {
            r.reject(reason);
            Ok(())
        })
    }

    /// Fulfills with every value, in input order, once all inputs fulfill.
    /// Rejects with the first rejection; later outcomes are discarded.
    /// An empty input fulfills with an empty vector.
    pub fn all(event_loop: &EventLoop, futures: Vec<Future<T, E>>) -> Future<Vec<T>, E> {
        let (output, resolver) = Future::with_resolvers(event_loop);
        let total = futures.len();
        if total == 0 {
            resolver.resolve(Vec::new());
            return output;
        }

        let slots: Rc<RefCell<Vec<Option<T>>>> = Rc::new(RefCell::new(vec![None; total]));
        let remaining = Rc::new(Cell::new(total));
        for (index, future) in futures.iter().enumerate() {
            let slots = slots.clone();
            let remaining = remaining.clone();
            let on_value = resolver.clone();
            let on_reason = resolver.clone();
            future.then(
                move |value| {
                    slots.borrow_mut()[index] = Some(value);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let values: Vec<T> = slots.borrow_mut().drain(..).flatten().collect();
                        on_value.resolve(values);
                    }
                    Ok(())
                },
                move |reason| {
                    on_reason.reject(reason);
                    Ok(())
                },
            );
        }
        output
    }

    /// Fulfills once every input settles, with one record per input in the
    /// order the inputs settled. Never rejects.
    pub fn all_settled(
        event_loop: &EventLoop,
        futures: Vec<Future<T, E>>,
    ) -> Future<Vec<Settled<T, E>>, E> {
        let (output, resolver) = Future::with_resolvers(event_loop);
        let total = futures.len();
        if total == 0 {
            resolver.resolve(Vec::new());
            return output;
        }

        let records: Rc<RefCell<Vec<Settled<T, E>>>> =
            Rc::new(RefCell::new(Vec::with_capacity(total)));
        let record = move |outcome: Settled<T, E>| {
            let mut records = records.borrow_mut();
            records.push(outcome);
            if records.len() == total {
                resolver.resolve(std::mem::take(&mut *records));
            }
        };
        let record = Rc::new(record);

        for future in &futures {
            let on_value = record.clone();
            let on_reason = record.clone();
            future.then(
                move |value| {
                    (*on_value)(Settled::Fulfilled { value });
                    Ok(())
                },
                move |reason| {
                    (*on_reason)(Settled::Rejected { reason });
                    Ok(())
                },
            );
        }
        output
    }

    /// Settles like whichever input settles first. An empty input never
    /// settles.
    pub fn race(event_loop: &EventLoop, futures: Vec<Future<T, E>>) -> Future<T, E> {
        let (output, resolver) = Future::with_resolvers(event_loop);
        if futures.is_empty() {
            debug!(future = output.id(), "race over no inputs stays pending");
        }
        for future in &futures {
            let on_value = resolver.clone();
            let on_reason = resolver.clone();
            future.then(
                move |value| {
                    on_value.resolve(value);
                    Ok(())
                },
                move |reason| {
                    on_reason.reject(reason);
                    Ok(())
                },
            );
        }
        output
    }

    /// Fulfills with the first input to fulfill. If every input rejects,
    /// rejects with an [`AggregateError`] holding the reasons in rejection
    /// order. An empty input rejects with an empty aggregate.
    pub fn any(
        event_loop: &EventLoop,
        futures: Vec<Future<T, E>>,
    ) -> Future<T, AggregateError<E>> {
        let (output, resolver) = Future::with_resolvers(event_loop);
        let total = futures.len();
        if total == 0 {
            resolver.reject(AggregateError::new(Vec::new()));
            return output;
        }

        let errors: Rc<RefCell<Vec<E>>> = Rc::new(RefCell::new(Vec::with_capacity(total)));
        for future in &futures {
            let on_value = resolver.clone();
            let on_reason = resolver.clone();
            let errors = errors.clone();
            future.then(
                move |value| {
                    on_value.resolve(value);
                    Ok(())
                },
                move |reason| {
                    let mut errors = errors.borrow_mut();
                    errors.push(reason);
                    if errors.len() == total {
                        on_reason.reject(AggregateError::new(std::mem::take(&mut *errors)));
                    }
                    Ok(())
                },
            );
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::Status;

    type F = Future<i32, &'static str>;

    #[test]
    fn resolve_and_reject_settle_on_drain() {
        let el = EventLoop::new();
        let ok = F::resolve(&el, 1);
        let err = F::reject(&el, "x");
        assert!(ok.is_pending() && err.is_pending());
        el.run_microtasks().unwrap();
        assert_eq!(ok.value(), Some(1));
        assert_eq!(err.reason(), Some("x"));
    }

    #[test]
    fn all_keeps_input_order_not_settlement_order() {
        let el = EventLoop::new();
        let slow = F::from_timeout(&el, 300, 1);
        let mid = F::from_timeout(&el, 200, 2);
        let fast = F::from_timeout(&el, 100, 3);
        let all = F::all(&el, vec![slow, mid, fast]);
        el.run().unwrap();
        assert_eq!(all.value(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn all_of_nothing_is_empty() {
        let el = EventLoop::new();
        let all = F::all(&el, Vec::new());
        el.run_microtasks().unwrap();
        assert_eq!(all.value(), Some(Vec::new()));
    }

    #[test]
    fn all_rejects_with_first_reason_and_ignores_rest() {
        let el = EventLoop::new();
        let a = F::reject_after(&el, 10, "first");
        let b = F::reject_after(&el, 20, "second");
        let c = F::from_timeout(&el, 30, 3);
        let all = F::all(&el, vec![c.clone(), a, b]);
        el.run().unwrap();
        assert_eq!(all.reason(), Some("first"));
        // The still-running input kept going.
        assert_eq!(c.value(), Some(3));
    }

    #[test]
    fn all_settled_records_in_settlement_order() {
        let el = EventLoop::new();
        let late = F::from_timeout(&el, 50, 1);
        let early = F::reject_after(&el, 10, "x");
        let settled = F::all_settled(&el, vec![late, early]);
        el.run().unwrap();
        assert_eq!(
            settled.value(),
            Some(vec![
                Settled::Rejected { reason: "x" },
                Settled::Fulfilled { value: 1 },
            ])
        );
    }

    #[test]
    fn race_takes_first_rejection_too() {
        let el = EventLoop::new();
        let ok = F::from_timeout(&el, 100, 1);
        let err = F::reject_after(&el, 10, "fast failure");
        let raced = F::race(&el, vec![ok, err]);
        el.run().unwrap();
        assert_eq!(raced.reason(), Some("fast failure"));
    }

    #[test]
    fn race_of_nothing_stays_pending() {
        let el = EventLoop::new();
        let raced = F::race(&el, Vec::new());
        el.run().unwrap();
        assert_eq!(raced.status(), Status::Pending);
    }

    #[test]
    fn any_ignores_rejections_before_a_fulfillment() {
        let el = EventLoop::new();
        let a = F::reject_after(&el, 10, "e1");
        let b = F::from_timeout(&el, 20, 7);
        let c = F::reject_after(&el, 5, "e0");
        let any = F::any(&el, vec![a, b, c]);
        el.run().unwrap();
        assert_eq!(any.value(), Some(7));
    }

    #[test]
    fn any_of_nothing_rejects_empty() {
        let el = EventLoop::new();
        let any = F::any(&el, Vec::new());
        el.run_microtasks().unwrap();
        assert_eq!(any.reason(), Some(AggregateError::new(Vec::new())));
    }
}
