//! # Example: storage_context
//!
//! A database driver wraps each query in a storage run; an APM agent binds a
//! span store to it and sees the current span from inside the driver's code
//! without the driver knowing about the agent.
//!
//! ## Flow
//! ```text
//! agent:  bind_store_with("db.query", spans, |q| Span::from(q))
//! driver: storage_channel("db.query").run(query, || execute(query))
//!             ├─► enter-store: spans = Span{..}
//!             ├─► execute()  ── spans.get_current() == Some(Span{..})
//!             └─► exit-store:  spans restored
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example storage_context
//! ```

use std::sync::Arc;

use diagnostics_channel::{AmbientStore, ContextStore, bind_store_with, storage_channel};

#[derive(Debug)]
struct Query {
    sql: &'static str,
}

#[derive(Debug, Clone)]
struct Span {
    id: u64,
    statement: String,
}

mod driver {
    use super::Query;
    use diagnostics_channel::storage_channel;

    pub fn query(sql: &'static str, execute: impl FnOnce() -> usize) -> anyhow::Result<usize> {
        Ok(storage_channel("db.query")?.run(Query { sql }, execute))
    }
}

fn main() -> anyhow::Result<()> {
    let spans = Arc::new(AmbientStore::<Span>::new());

    let ids = std::sync::Mutex::new(0u64);
    let binding = bind_store_with("db.query", spans.clone(), move |data| {
        let query = data.downcast_ref::<Query>()?;
        let mut id = ids.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *id += 1;
        Some(Span {
            id: *id,
            statement: query.sql.to_string(),
        })
    })?;

    let rows = driver::query("select * from users", || {
        if let Some(span) = spans.get_current() {
            println!("inside driver: span #{} for {:?}", span.id, span.statement);
        }

        driver::query("select * from roles", || {
            println!("nested query span: {:?}", spans.get_current());
            3
        })
        .unwrap_or(0)
            + 2
    })?;

    println!("rows={rows}, span after run: {:?}", spans.get_current());
    println!("bound: {}", storage_channel("db.query")?.is_bound_to_store(&spans));
    binding.dispose();
    println!("bound after dispose: {}", storage_channel("db.query")?.is_bound_to_store(&spans));
    Ok(())
}
