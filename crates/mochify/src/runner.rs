//! Synthetic runner.
//!
//! Stands in for the framework's runner on the host: it keeps the same
//! counters the framework would and hands every event to a reporter, which
//! cannot tell the tests ran in a browser.

use crate::event::RunnerEvent;
use crate::reporter::Reporter;
use crate::result::MochifyResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Run counters, serialized in the framework's `stats` shape
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    /// Non-root suites started
    pub suites: usize,
    /// Tests finished
    pub tests: usize,
    /// Tests passed
    pub passes: usize,
    /// Tests skipped
    pub pending: usize,
    /// Tests failed
    pub failures: usize,
    /// Run start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Run end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Run duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Stats {
    fn record(&mut self, event: &RunnerEvent) {
        match event {
            RunnerEvent::Start(start) => self.start = Some(start.start),
            RunnerEvent::End(end) => {
                self.end = Some(end.end);
                self.duration = end.duration.or_else(|| {
                    self.start
                        .map(|start| (end.end - start).num_milliseconds() as f64)
                });
            }
            RunnerEvent::SuiteBegin(suite) if !suite.root => self.suites += 1,
            RunnerEvent::TestPass(_) => self.passes += 1,
            RunnerEvent::TestPending(_) => self.pending += 1,
            RunnerEvent::TestFail(..) => self.failures += 1,
            RunnerEvent::TestEnd(_) => self.tests += 1,
            RunnerEvent::SuiteBegin(_)
            | RunnerEvent::SuiteEnd(_)
            | RunnerEvent::DelayBegin(_)
            | RunnerEvent::DelayEnd(_) => {}
        }
    }
}

/// Runner that forwards re-emitted events to a reporter
#[derive(Debug)]
pub struct Runner<R: Reporter> {
    reporter: R,
    stats: Stats,
}

impl<R: Reporter> Runner<R> {
    /// Wrap a reporter
    #[must_use]
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            stats: Stats::default(),
        }
    }

    /// Update the counters, then notify the reporter
    pub fn emit(&mut self, event: &RunnerEvent) -> MochifyResult<()> {
        tracing::trace!(event = %event.name(), "emit");
        self.stats.record(event);
        self.reporter.on_event(event, &self.stats)
    }

    /// Counters so far
    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The wrapped reporter
    #[must_use]
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Unwrap the reporter
    pub fn into_reporter(self) -> R {
        self.reporter
    }
}
