//! Test support: a process-wide collecting reporter.
//!
//! Unit tests share one process, so the reporter is installed once and every
//! test filters reports by its own (unique) channel name.

use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{Config, configure};
use crate::error::SubscriberPanic;
use crate::report::ReportError;

#[derive(Default)]
pub(crate) struct Reports(Mutex<Vec<SubscriberPanic>>);

impl Reports {
    pub(crate) fn for_channel(&self, channel: &str) -> Vec<SubscriberPanic> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.channel == channel)
            .cloned()
            .collect()
    }
}

impl ReportError for Reports {
    fn report(&self, err: SubscriberPanic) {
        self.0.lock().unwrap().push(err);
    }
}

/// Installs the collecting reporter (once) and returns it.
pub(crate) fn reports() -> Arc<Reports> {
    static REPORTS: OnceLock<Arc<Reports>> = OnceLock::new();
    REPORTS
        .get_or_init(|| {
            let reports = Arc::new(Reports::default());
            configure(Config::default().with_reporter(reports.clone()));
            reports
        })
        .clone()
}

/// Lets deferred jobs spawned on the current runtime run.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
