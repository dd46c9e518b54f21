//! Subscriber failures are isolated from the publisher and reported later.
//!
//! This binary installs a queueing scheduler, so the test drains deferred
//! jobs explicitly instead of relying on a runtime.

use std::sync::{Arc, Mutex};

use diagnostics_channel::{
    Config, Defer, Job, ReportError, Subscriber, SubscriberPanic, channel, config, configure,
};

#[derive(Default)]
struct Queue(Mutex<Vec<Job>>);

impl Queue {
    fn drain(&self) -> usize {
        let jobs: Vec<Job> = std::mem::take(&mut *self.0.lock().unwrap());
        let n = jobs.len();
        jobs.into_iter().for_each(|job| job());
        n
    }
}

impl Defer for Queue {
    fn defer(&self, job: Job) {
        self.0.lock().unwrap().push(job);
    }
}

#[derive(Default)]
struct Collect(Mutex<Vec<SubscriberPanic>>);

impl ReportError for Collect {
    fn report(&self, err: SubscriberPanic) {
        self.0.lock().unwrap().push(err);
    }
}

#[test]
fn failing_subscriber_is_reported_after_publish_returns() {
    let queue = Arc::new(Queue::default());
    let collect = Arc::new(Collect::default());
    configure(
        Config::default()
            .with_reporter(collect.clone())
            .with_scheduler(queue.clone()),
    );
    assert!(format!("{:?}", config()).starts_with("Config"));

    let ch = channel("it.report.isolated").unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (before, after) = (Arc::clone(&log), Arc::clone(&log));

    ch.subscribe(Subscriber::new(move |_, _| before.lock().unwrap().push("before")));
    ch.subscribe(Subscriber::new(|_, _| panic!("subscriber exploded")).with_name("bomb"));
    ch.subscribe(Subscriber::new(move |_, _| after.lock().unwrap().push("after")));

    ch.publish(&());

    assert_eq!(log.lock().unwrap().as_slice(), ["before", "after"]);
    assert!(collect.0.lock().unwrap().is_empty());

    assert_eq!(queue.drain(), 1);
    let reports = collect.0.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].channel, "it.report.isolated");
    assert_eq!(reports[0].subscriber, "bomb");
    assert_eq!(reports[0].message, "subscriber exploded");
    assert_eq!(reports[0].as_label(), "subscriber_panicked");
}
