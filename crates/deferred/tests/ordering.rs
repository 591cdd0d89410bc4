// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Settlement, chaining, and scheduling order, observed through a fresh
//! event loop per test.

use std::cell::RefCell;
use std::rc::Rc;

use deferred::{EventLoop, Future, Status};

type F = Future<i32, String>;
type Log = Rc<RefCell<Vec<String>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

#[test]
fn status_leaves_pending_once() {
    init_tracing();
    let el = EventLoop::new();
    let (f, r) = F::with_resolvers(&el);
    r.resolve(1);
    r.resolve(2);
    el.run_microtasks().unwrap();
    assert_eq!(f.status(), Status::Fulfilled);
    assert_eq!(f.value(), Some(1));

    r.reject("too late".to_string());
    r.resolve(3);
    el.run().unwrap();
    assert_eq!(f.status(), Status::Fulfilled);
    assert_eq!(f.value(), Some(1));
    assert_eq!(f.reason(), None);
}

#[test]
fn empty_then_is_identity_for_values() {
    init_tracing();
    let el = EventLoop::new();
    let f = F::resolve(&el, 10);
    let chained = f.passthrough().passthrough();
    el.run().unwrap();
    assert_eq!(chained.value(), Some(10));
}

#[test]
fn empty_then_rethrows_reasons() {
    init_tracing();
    let el = EventLoop::new();
    let f = F::reject(&el, "nope".to_string());
    let chained = f.passthrough().on_fulfilled(|v| Ok(v + 1)).passthrough();
    el.run().unwrap();
    assert_eq!(chained.reason(), Some("nope".to_string()));
}

#[test]
fn reactions_on_pending_future_fire_in_registration_order() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let (f, r) = F::with_resolvers(&el);
    let a = seen.clone();
    f.on_fulfilled(move |_| {
        push(&a, "a");
        Ok(())
    });
    let b = seen.clone();
    f.on_fulfilled(move |_| {
        push(&b, "b");
        Ok(())
    });
    r.resolve(0);
    assert!(seen.borrow().is_empty());
    el.run_microtasks().unwrap();
    assert_eq!(*seen.borrow(), vec!["a", "b"]);
}

#[test]
fn only_the_matching_branch_runs() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let (f, r) = F::with_resolvers(&el);
    let ok = seen.clone();
    let err = seen.clone();
    f.then(
        move |v| {
            push(&ok, format!("fulfilled {}", v));
            Ok(())
        },
        move |e| {
            push(&err, format!("rejected {}", e));
            Ok(())
        },
    );
    r.reject("x".to_string());
    el.run().unwrap();
    assert_eq!(*seen.borrow(), vec!["rejected x"]);
}

#[test]
fn then_on_settled_future_runs_before_queued_microtasks() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let f = F::resolve(&el, 1);
    el.run_microtasks().unwrap();
    assert_eq!(f.status(), Status::Fulfilled);

    let m = seen.clone();
    el.queue_microtask(move || push(&m, "microtask"));
    let h = seen.clone();
    f.on_fulfilled(move |v| {
        push(&h, format!("handler {}", v));
        Ok(())
    });
    assert_eq!(*seen.borrow(), vec!["handler 1"]);

    el.run_microtasks().unwrap();
    assert_eq!(*seen.borrow(), vec!["handler 1", "microtask"]);
}

#[test]
fn executor_runs_synchronously_and_reactions_wait_for_the_turn() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let ex = seen.clone();
    let f = F::new(&el, move |r| {
        push(&ex, "executor");
        r.resolve(5);
        Ok(())
    });
    let h = seen.clone();
    f.on_fulfilled(move |v| {
        push(&h, format!("then {}", v));
        Ok(())
    });
    push(&seen, "sync tail");
    el.run_microtasks().unwrap();
    assert_eq!(*seen.borrow(), vec!["executor", "sync tail", "then 5"]);
}

#[test]
fn chain_converts_errors_and_recovers() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let p1 = F::from_timeout(&el, 1000, 1111);

    let s1 = seen.clone();
    let s2 = seen.clone();
    let s3 = seen.clone();
    let done = p1
        .on_fulfilled(move |res| {
            push(&s1, res.to_string());
            Ok("success1".to_string())
        })
        .on_fulfilled(move |res| {
            push(&s2, res);
            Err::<String, _>("error1".to_string())
        })
        .catch(move |err| {
            push(&s3, format!("caught {}", err));
            Ok("recovered".to_string())
        });

    el.run().unwrap();
    assert_eq!(*seen.borrow(), vec!["1111", "success1", "caught error1"]);
    assert_eq!(done.value(), Some("recovered".to_string()));
    assert_eq!(el.now_ms(), 1000);
}

#[test]
fn finally_runs_after_either_outcome_and_is_chainable() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let ok = F::resolve(&el, 1);
    let err = F::reject(&el, "bad".to_string());

    let a = seen.clone();
    let ok_tail = ok
        .finally(move || {
            push(&a, "finally ok");
            Ok(())
        })
        .on_fulfilled(|v| Ok(v * 100));
    let b = seen.clone();
    let err_tail = err
        .finally(move || {
            push(&b, "finally err");
            Ok(())
        })
        .catch(|e| Ok(e.len() as i32));

    el.run().unwrap();
    assert_eq!(*seen.borrow(), vec!["finally ok", "finally err"]);
    assert_eq!(ok_tail.value(), Some(100));
    assert_eq!(err_tail.value(), Some(3));
}

#[test]
fn settled_future_delivers_to_late_observers() {
    init_tracing();
    let el = EventLoop::new();
    let f = F::reject(&el, "kept".to_string());
    el.run().unwrap();
    // Nobody was watching at settlement; the reason is retained.
    let late = f.catch(|e| Ok(e.len() as i32));
    el.run().unwrap();
    assert_eq!(late.value(), Some(4));
}

#[test]
fn downstream_settles_one_microtask_after_its_source() {
    init_tracing();
    let el = EventLoop::new();
    let seen = log();
    let (f, r) = F::with_resolvers(&el);
    let first = seen.clone();
    let second = seen.clone();
    f.on_fulfilled(move |_| {
        push(&first, "first link");
        Ok(())
    })
    .on_fulfilled(move |_| {
        push(&second, "second link");
        Ok(())
    });
    let m = seen.clone();
    r.resolve(0);
    el.queue_microtask(move || push(&m, "queued after resolve"));
    el.run_microtasks().unwrap();
    assert_eq!(
        *seen.borrow(),
        vec!["first link", "queued after resolve", "second link"]
    );
}
