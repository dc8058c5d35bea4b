//! Event vocabulary shared by the page agent and the host adapter.
//!
//! ```text
//!  wire name         RunnerEvent          payload
//!  ─────────────     ─────────────        ──────────────────────────────
//!  start             Start                {start}
//!  end               End                  {end, duration}
//!  suite             SuiteBegin           {root, title, pending, delayed}
//!  suite end         SuiteEnd             {}
//!  waiting / ready   DelayBegin/DelayEnd  {}
//!  pending/pass/     TestPending/..       test record
//!    test end
//!  fail              TestFail             test record + err (encoded)
//! ```
//!
//! `console.*`, `mochify.coverage` and `mochify.callback` are handled by the
//! pump and never reach the runner.

use crate::reconstruct::Reconstructor;
use crate::result::{MochifyError, MochifyResult};
use crate::shadow::Shadow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Host console method targeted by a `console.*` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    /// `console.debug`
    Debug,
    /// `console.log`
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl ConsoleLevel {
    /// Every captured console method
    pub const ALL: [Self; 5] = [Self::Debug, Self::Log, Self::Info, Self::Warn, Self::Error];

    /// Method name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a method name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.name() == name)
    }

    /// Whether the level writes to stderr
    #[must_use]
    pub const fn is_stderr(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

/// Event names as they travel over the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Run begin
    Start,
    /// Run end
    End,
    /// Suite begin
    Suite,
    /// Suite end
    SuiteEnd,
    /// Delay begin
    Waiting,
    /// Delay end
    Ready,
    /// Test skipped
    Pending,
    /// Test passed
    Pass,
    /// Test failed
    Fail,
    /// Test finished
    TestEnd,
    /// Console output
    Console(ConsoleLevel),
    /// Coverage data
    Coverage,
    /// Run completion with the exit code
    Callback,
    /// Anything else
    Unknown(String),
}

impl EventName {
    /// Parse a wire name; unrecognised names are preserved
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "start" => Self::Start,
            "end" => Self::End,
            "suite" => Self::Suite,
            "suite end" => Self::SuiteEnd,
            "waiting" => Self::Waiting,
            "ready" => Self::Ready,
            "pending" => Self::Pending,
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "test end" => Self::TestEnd,
            "mochify.coverage" => Self::Coverage,
            "mochify.callback" => Self::Callback,
            other => other
                .strip_prefix("console.")
                .and_then(ConsoleLevel::parse)
                .map_or_else(|| Self::Unknown(other.to_string()), Self::Console),
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Suite => "suite",
            Self::SuiteEnd => "suite end",
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Pending => "pending",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::TestEnd => "test end",
            Self::Console(ConsoleLevel::Debug) => "console.debug",
            Self::Console(ConsoleLevel::Log) => "console.log",
            Self::Console(ConsoleLevel::Info) => "console.info",
            Self::Console(ConsoleLevel::Warn) => "console.warn",
            Self::Console(ConsoleLevel::Error) => "console.error",
            Self::Coverage => "mochify.coverage",
            Self::Callback => "mochify.callback",
            Self::Unknown(name) => name,
        }
    }

    /// Whether the event is part of the framework lifecycle
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        !matches!(
            self,
            Self::Console(_) | Self::Coverage | Self::Callback | Self::Unknown(_)
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run begin payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStart {
    /// Start time
    pub start: DateTime<Utc>,
}

/// Run end payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEnd {
    /// End time
    pub end: DateTime<Utc>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Suite payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteRecord {
    /// Whether this is the root suite
    pub root: bool,
    /// Suite title
    pub title: String,
    /// Whether the suite is skipped
    pub pending: bool,
    /// Whether the run was delayed
    pub delayed: bool,
}

/// Test state as reported by the framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    /// Passed
    Passed,
    /// Failed
    Failed,
    /// Skipped
    Pending,
}

/// Speed classification relative to the slow threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// Above the slow threshold
    Slow,
    /// Above half the slow threshold
    Medium,
    /// Everything else
    Fast,
}

impl Speed {
    /// Classify a duration against a slow threshold, both in milliseconds
    #[must_use]
    pub fn classify(duration: f64, slow: f64) -> Self {
        if duration > slow {
            Self::Slow
        } else if duration > slow / 2.0 {
            Self::Medium
        } else {
            Self::Fast
        }
    }
}

/// Test-shaped record rebuilt from a lifecycle payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Always `test` for tests; hooks report `hook`
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    /// Test title
    #[serde(default)]
    pub title: String,
    /// Whether the test timed out
    #[serde(rename = "timedOut", default)]
    pub timed_out: bool,
    /// Whether the test is skipped
    #[serde(default)]
    pub pending: bool,
    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Speed classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<Speed>,
    /// Final state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TestState>,
    #[serde(rename = "_slow", default = "default_slow")]
    slow: f64,
    #[serde(rename = "_currentRetry", default)]
    current_retry: u32,
    #[serde(rename = "_fullTitle", default)]
    full_title: String,
    #[serde(rename = "_titlePath", default)]
    title_path: Vec<String>,
}

fn default_type() -> String {
    "test".to_string()
}

const fn default_slow() -> f64 {
    75.0
}

impl TestRecord {
    /// Create a record from the titles of the enclosing suites and the test
    #[must_use]
    pub fn new(title_path: Vec<String>) -> Self {
        let title = title_path.last().cloned().unwrap_or_default();
        let full_title = title_path
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            kind: default_type(),
            title,
            timed_out: false,
            pending: false,
            duration: None,
            speed: None,
            state: None,
            slow: default_slow(),
            current_retry: 0,
            full_title,
            title_path,
        }
    }

    /// Mark as passed after `duration` milliseconds
    #[must_use]
    pub fn passed(mut self, duration: f64) -> Self {
        self.state = Some(TestState::Passed);
        self.speed = Some(Speed::classify(duration, self.slow));
        self.duration = Some(duration);
        self
    }

    /// Mark as failed after `duration` milliseconds
    #[must_use]
    pub fn failed(mut self, duration: f64) -> Self {
        self.state = Some(TestState::Failed);
        self.duration = Some(duration);
        self
    }

    /// Mark as skipped
    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.state = Some(TestState::Pending);
        self.pending = true;
        self
    }

    /// Set the slow threshold in milliseconds
    #[must_use]
    pub fn with_slow(mut self, slow: f64) -> Self {
        self.slow = slow;
        self
    }

    /// Set the retry counter
    #[must_use]
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.current_retry = retry;
        self
    }

    /// `fullTitle()`
    #[must_use]
    pub fn full_title(&self) -> &str {
        &self.full_title
    }

    /// `titlePath()`
    #[must_use]
    pub fn title_path(&self) -> &[String] {
        &self.title_path
    }

    /// `currentRetry()`
    #[must_use]
    pub const fn current_retry(&self) -> u32 {
        self.current_retry
    }

    /// `slow()`
    #[must_use]
    pub const fn slow(&self) -> f64 {
        self.slow
    }
}

/// Lifecycle event re-emitted on the local runner
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    /// Run begin
    Start(RunStart),
    /// Run end
    End(RunEnd),
    /// Suite begin
    SuiteBegin(SuiteRecord),
    /// Suite end
    SuiteEnd(SuiteRecord),
    /// Delay begin
    DelayBegin(Value),
    /// Delay end
    DelayEnd(Value),
    /// Test skipped
    TestPending(TestRecord),
    /// Test passed
    TestPass(TestRecord),
    /// Test failed with its reconstructed error
    TestFail(TestRecord, Shadow),
    /// Test finished
    TestEnd(TestRecord),
}

fn payload<T: serde::de::DeserializeOwned>(name: &EventName, data: &Value) -> MochifyResult<T> {
    serde_json::from_value(data.clone())
        .map_err(|e| MochifyError::protocol(format!("{name} payload: {e}")))
}

impl RunnerEvent {
    /// Decode a lifecycle payload.
    ///
    /// Returns `Ok(None)` for names outside the lifecycle set.
    pub fn decode(
        name: &EventName,
        data: &Value,
        reconstructor: &Reconstructor,
    ) -> MochifyResult<Option<Self>> {
        let event = match name {
            EventName::Start => Self::Start(payload(name, data)?),
            EventName::End => Self::End(payload(name, data)?),
            EventName::Suite => Self::SuiteBegin(payload(name, data)?),
            EventName::SuiteEnd => Self::SuiteEnd(payload(name, data)?),
            EventName::Waiting => Self::DelayBegin(data.clone()),
            EventName::Ready => Self::DelayEnd(data.clone()),
            EventName::Pending => Self::TestPending(payload(name, data)?),
            EventName::Pass => Self::TestPass(payload(name, data)?),
            EventName::TestEnd => Self::TestEnd(payload(name, data)?),
            EventName::Fail => {
                let test = payload(name, data)?;
                let err = data
                    .get("err")
                    .map_or(Shadow::Undefined, |err| reconstructor.reconstruct(err));
                Self::TestFail(test, err)
            }
            EventName::Console(_)
            | EventName::Coverage
            | EventName::Callback
            | EventName::Unknown(_) => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Wire name of the event
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::Start(_) => EventName::Start,
            Self::End(_) => EventName::End,
            Self::SuiteBegin(_) => EventName::Suite,
            Self::SuiteEnd(_) => EventName::SuiteEnd,
            Self::DelayBegin(_) => EventName::Waiting,
            Self::DelayEnd(_) => EventName::Ready,
            Self::TestPending(_) => EventName::Pending,
            Self::TestPass(_) => EventName::Pass,
            Self::TestFail(..) => EventName::Fail,
            Self::TestEnd(_) => EventName::TestEnd,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod name_tests {
        use super::*;

        #[test]
        fn test_parse_round_trips_known_names() {
            for name in [
                "start", "end", "suite", "suite end", "waiting", "ready", "pending", "pass",
                "fail", "test end", "console.log", "console.warn", "mochify.coverage",
                "mochify.callback",
            ] {
                assert_eq!(EventName::parse(name).as_str(), name);
            }
        }

        #[test]
        fn test_unknown_names_are_preserved() {
            assert_eq!(EventName::parse("hook"), EventName::Unknown("hook".into()));
            assert_eq!(
                EventName::parse("console.table"),
                EventName::Unknown("console.table".into())
            );
            assert!(!EventName::parse("hook").is_lifecycle());
            assert!(EventName::parse("pass").is_lifecycle());
        }

        #[test]
        fn test_console_levels() {
            assert_eq!(EventName::parse("console.error"), EventName::Console(ConsoleLevel::Error));
            assert!(ConsoleLevel::Warn.is_stderr());
            assert!(!ConsoleLevel::Info.is_stderr());
        }
    }

    mod record_tests {
        use super::*;

        fn test_payload() -> Value {
            json!({
                "title": "works",
                "type": "test",
                "state": "passed",
                "pending": false,
                "duration": 12.0,
                "timedOut": false,
                "speed": "fast",
                "_slow": 75.0,
                "_currentRetry": 1,
                "_fullTitle": "suite works",
                "_titlePath": ["suite", "works"]
            })
        }

        #[test]
        fn test_accessors_return_underscore_fields() {
            let test: TestRecord = serde_json::from_value(test_payload()).unwrap();
            assert_eq!(test.full_title(), "suite works");
            assert_eq!(test.title_path(), &["suite".to_string(), "works".to_string()]);
            assert_eq!(test.current_retry(), 1);
            assert!((test.slow() - 75.0).abs() < f64::EPSILON);
            assert_eq!(test.state, Some(TestState::Passed));
            assert_eq!(test.speed, Some(Speed::Fast));
        }

        #[test]
        fn test_record_wire_shape() {
            let record = TestRecord::new(vec!["suite".into(), "works".into()])
                .with_retry(1)
                .passed(12.0);
            let encoded = serde_json::to_value(&record).unwrap();
            assert_eq!(encoded, test_payload());
        }

        #[test]
        fn test_speed_classification() {
            assert_eq!(Speed::classify(100.0, 75.0), Speed::Slow);
            assert_eq!(Speed::classify(40.0, 75.0), Speed::Medium);
            assert_eq!(Speed::classify(10.0, 75.0), Speed::Fast);
        }

        #[test]
        fn test_root_suite_full_title() {
            let record = TestRecord::new(vec![String::new(), "top".into()]);
            assert_eq!(record.full_title(), "top");
        }
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_start_timestamp_becomes_date() {
            let event = RunnerEvent::decode(
                &EventName::Start,
                &json!({"start": "2024-01-02T03:04:05.000Z"}),
                &Reconstructor::default(),
            )
            .unwrap()
            .unwrap();
            let RunnerEvent::Start(start) = event else {
                panic!("expected start");
            };
            assert_eq!(start.start.timestamp(), 1_704_164_645);
        }

        #[test]
        fn test_fail_reconstructs_error() {
            let event = RunnerEvent::decode(
                &EventName::Fail,
                &json!({"title": "t", "_fullTitle": "t", "err": ["Error", "boom", null, [], []]}),
                &Reconstructor::default(),
            )
            .unwrap()
            .unwrap();
            let RunnerEvent::TestFail(test, Shadow::Error(err)) = event else {
                panic!("expected fail with error");
            };
            assert_eq!(test.title, "t");
            assert_eq!(err.message, "boom");
        }

        #[test]
        fn test_non_lifecycle_names() {
            let decoded = RunnerEvent::decode(
                &EventName::Callback,
                &json!({"code": 0}),
                &Reconstructor::default(),
            )
            .unwrap();
            assert!(decoded.is_none());
        }

        #[test]
        fn test_malformed_payload_is_protocol_error() {
            let result = RunnerEvent::decode(
                &EventName::Start,
                &json!({"start": 5}),
                &Reconstructor::default(),
            );
            assert!(matches!(result, Err(MochifyError::ProtocolError { .. })));
        }

        #[test]
        fn test_suite_end_accepts_empty_payload() {
            let event = RunnerEvent::decode(&EventName::SuiteEnd, &json!({}), &Reconstructor::default())
                .unwrap()
                .unwrap();
            assert_eq!(event, RunnerEvent::SuiteEnd(SuiteRecord::default()));
            assert_eq!(event.name(), EventName::SuiteEnd);
        }
    }
}
