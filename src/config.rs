//! # Process-wide configuration.
//!
//! Provides [`Config`], the collaborators the registry hands work to:
//! - **Reporter**: receives isolated subscriber failures.
//! - **Scheduler**: runs those reports on a later turn.
//!
//! Config is used in two ways:
//! 1. **Installation**: [`configure`] replaces the active config.
//! 2. **Lookup**: `publish` reads it via [`config`] only when a subscriber
//!    has panicked, never on the hot path.

use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::report::{Defer, LogReporter, ReportError, RuntimeDefer};

static ACTIVE: LazyLock<RwLock<Arc<Config>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Config::default())));

/// Collaborators used for deferred failure reporting.
///
/// ## Field semantics
/// - `reporter`: called once per panicking subscriber invocation
/// - `scheduler`: decides when (and on which thread) the reporter runs
#[derive(Clone)]
pub struct Config {
    /// Sink for [`SubscriberPanic`](crate::SubscriberPanic) reports.
    pub reporter: Arc<dyn ReportError>,
    /// "Run later" hook; the reporter is never called synchronously.
    pub scheduler: Arc<dyn Defer>,
}

impl Config {
    /// Replaces the reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ReportError>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces the scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Defer>) -> Self {
        self.scheduler = scheduler;
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `reporter = LogReporter` (logs through `tracing` at error level)
    /// - `scheduler = RuntimeDefer` (tokio task when inside a runtime, thread otherwise)
    fn default() -> Self {
        Self {
            reporter: Arc::new(LogReporter),
            scheduler: Arc::new(RuntimeDefer),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").finish_non_exhaustive()
    }
}

/// Installs `cfg` as the process-wide configuration.
///
/// Reports already scheduled keep the reporter they were scheduled with.
pub fn configure(cfg: Config) {
    let mut active = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    *active = Arc::new(cfg);
}

/// Returns the active configuration.
pub fn config() -> Arc<Config> {
    ACTIVE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
