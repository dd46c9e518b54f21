//! # Example: publish
//!
//! A producer publishes request events; a consumer counts them, and a faulty
//! consumer shows that its panic never reaches the producer.
//!
//! ## Flow
//! ```text
//! producer ──► channel("http.request").publish(&Request)
//!                 ├─► counter      (ok)
//!                 ├─► faulty       (panics, reported later via LogReporter)
//!                 └─► printer      (still called)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example publish
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use diagnostics_channel::{ChannelName, Subscriber, channel, has_subscribers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
struct Request {
    method: &'static str,
    path: &'static str,
}

fn handle(method: &'static str, path: &'static str) -> anyhow::Result<()> {
    let ch = channel("http.request")?;
    // Building the message is skipped entirely when nobody listens.
    if ch.has_subscribers() {
        ch.publish(&Request { method, path });
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    handle("GET", "/ignored")?;

    let seen = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&seen);
    let counter = Subscriber::typed(move |_: &Request, _: &ChannelName| {
        count.fetch_add(1, Ordering::Relaxed);
    })
    .with_name("counter");
    let faulty = Subscriber::typed(|req: &Request, _: &ChannelName| {
        if req.path == "/boom" {
            panic!("cannot handle {}", req.path);
        }
    })
    .with_name("faulty");
    let printer = Subscriber::typed(|req: &Request, name: &ChannelName| {
        println!("[{name}] {} {}", req.method, req.path);
    })
    .with_name("printer");

    let ch = channel("http.request")?;
    for sub in [&counter, &faulty, &printer] {
        ch.subscribe(sub.clone());
    }

    handle("GET", "/health")?;
    handle("POST", "/boom")?;
    handle("GET", "/metrics")?;

    // Let the deferred panic report run.
    tokio::time::sleep(Duration::from_millis(10)).await;

    for sub in [&counter, &faulty, &printer] {
        ch.unsubscribe(sub);
    }
    println!(
        "counted {} requests, subscribers left: {}",
        seen.load(Ordering::Relaxed),
        has_subscribers("http.request")
    );
    Ok(())
}
