//! # Deferred execution.
//!
//! [`Defer`] is the "run later" hook used to move failure reporting off the
//! publisher's call stack. [`RuntimeDefer`] is the default.
//!
//! ## Architecture
//! ```text
//! publish() ── catch_unwind ──► Defer::defer(job)
//!                                    │
//!                   ┌────────────────┴────────────────┐
//!                   ▼                                 ▼
//!       inside a tokio runtime:            outside any runtime:
//!       Handle::spawn(job)                 std::thread::spawn(job)
//!       (runs after the current            (runs concurrently with
//!        task yields)                       the publisher)
//! ```

/// Unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Schedules a job for a later turn.
///
/// Implementations must not run the job before `defer` returns on the
/// caller's stack.
pub trait Defer: Send + Sync + 'static {
    /// Queues `job`.
    fn defer(&self, job: Job);
}

/// Default scheduler.
///
/// - Inside a tokio runtime: spawns the job as a task, so it runs on a later
///   turn of that runtime (on a current-thread runtime, after the publisher
///   yields).
/// - Outside a runtime: hands the job to a short-lived named thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeDefer;

impl Defer for RuntimeDefer {
    fn defer(&self, job: Job) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            drop(handle.spawn(async move { job() }));
            return;
        }
        let spawned = std::thread::Builder::new()
            .name("diagnostics-channel-report".into())
            .spawn(job);
        if let Err(err) = spawned {
            tracing::error!(error = %err, "failed to spawn deferred report thread");
        }
    }
}
