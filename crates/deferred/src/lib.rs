// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deferred values with chained continuations.
//!
//! Single-threaded and cooperative. A [`Future`] settles through the
//! microtask queue of the [`EventLoop`] it was created on; `then` and
//! friends build dependent futures; the combinators derive one future from
//! many.
//!
//! Components:
//! - microtask/timer: the two host queues, drained by `EventLoop`
//! - future: status, stored outcome, settle-once, resolvers
//! - reaction: then/catch/finally chaining
//! - combinator: resolve/reject/all/all_settled/race/any
//!
//! ```
//! use deferred::{EventLoop, Future};
//!
//! let el = EventLoop::new();
//! let f: Future<i32, String> = Future::from_timeout(&el, 100, 20);
//! let g = f.on_fulfilled(|v| Ok(v + 1));
//! el.run().unwrap();
//! assert_eq!(g.value(), Some(21));
//! ```

mod combinator;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod future;
pub mod microtask;
mod reaction;
pub mod timer;

pub use config::LoopConfig;
pub use error::{AggregateError, ConfigError, LoopError};
pub use event_loop::{EventLoop, LoopStats};
pub use future::{Future, Resolver, Settled, Status};
pub use timer::TimerId;
