// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Three timer-driven rejections fed to `any` and `race`.
//!
//! Run with `RUST_LOG=deferred=debug` to see settlement logs.

use deferred::{AggregateError, EventLoop, Future, LoopConfig};

type Timed = Future<&'static str, &'static str>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let el = EventLoop::with_config(LoopConfig::from_env()?);

    let p1 = Timed::reject_after(&el, 1000, "1111");
    let p2 = Timed::reject_after(&el, 2000, "2222");
    let p3 = Timed::reject_after(&el, 3000, "3333");

    Timed::any(&el, vec![p1.clone(), p2.clone(), p3.clone()])
        .on_fulfilled(|res| {
            println!("any: {}", res);
            Ok(())
        })
        .catch(|agg: AggregateError<&'static str>| {
            println!("any rejected: {:?}", agg.errors);
            Ok(())
        });

    Timed::race(&el, vec![p1, p2, p3]).then(
        |res| {
            println!("race fulfilled: {}", res);
            Ok(())
        },
        |err| {
            println!("race rejected: {}", err);
            Ok(())
        },
    );

    let stats = el.run()?;
    println!(
        "loop idle at {} ms ({} microtasks, {} timers)",
        el.now_ms(),
        stats.microtasks,
        stats.timers
    );
    Ok(())
}
