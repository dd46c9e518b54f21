//! # Example: trace_lifecycle
//!
//! Traces a synchronous parse, a callback-style lookup and an async fetch,
//! logging every phase with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! trace(parse)           start → end
//! trace(parse "x")       start → error → end
//! trace_callback(lookup) start → end ... asyncEnd
//! trace_future(fetch)    start → end ... error → asyncEnd
//! ```
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! cargo run --example trace_lifecycle --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use diagnostics_channel::{LogWriter, TraceContext, TracingHandlers, tracing_channel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
struct Fetch {
    url: &'static str,
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

    let tc = tracing_channel("app.work")?;
    let log = LogWriter::handlers();
    let timing = TracingHandlers::new().on_async_end(|ctx: &TraceContext| {
        if let Some(fetch) = ctx.input::<Fetch>() {
            println!("fetch {} settled as {}", fetch.url, ctx.outcome().as_label());
        }
    });
    tc.subscribe(&log);
    tc.subscribe(&timing);

    let n = tc.trace(|| "42".parse::<u32>(), TraceContext::empty())?;
    println!("parsed {n}");
    let bad = tc.trace(|| "x".parse::<u32>(), TraceContext::empty());
    println!("parse failed: {}", bad.is_err());

    let (tx, rx) = tokio::sync::oneshot::channel();
    tc.trace_callback(
        |done| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                done.complete(Ok::<_, std::io::Error>("user:7"));
                let _ = tx.send(());
            });
        },
        TraceContext::new("lookup"),
    );
    rx.await?;

    let ctx = Arc::new(TraceContext::new(Fetch { url: "https://example.invalid" }));
    let fetched = tc
        .trace_future(
            || async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Err::<String, _>(std::io::Error::other("connection refused"))
            },
            ctx.clone(),
        )
        .await;
    println!("fetch error: {:?}", fetched.err().map(|e| e.to_string()));
    println!("context error: {:?}", ctx.error().map(|e| e.to_string()));

    tc.unsubscribe(&log);
    tc.unsubscribe(&timing);
    Ok(())
}
