//! In-process page agent.
//!
//! [`Agent`] is the Rust counterpart of `js/agent.js`: it adapts framework
//! lifecycle callbacks, console calls and global errors into queued events.
//! [`AgentDriver`] answers the driver contract from an agent, so the whole
//! host pipeline runs without a browser.

use crate::driver::MochifyDriver;
use crate::encoding::POLL_EXPRESSION;
use crate::event::{ConsoleLevel, EventName, SuiteRecord, TestRecord};
use crate::inject::{RECEIVE_PREFIX, RUN_EXPRESSION};
use crate::queue::EventQueue;
use crate::result::{MochifyError, MochifyResult};
use crate::serializer::{serialize, serialize_all};
use crate::value::HostValue;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Event producer sitting between the framework and the queue
#[derive(Debug, Clone, Default)]
pub struct Agent {
    queue: EventQueue,
}

impl Agent {
    /// Create an agent with an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying queue
    #[must_use]
    pub const fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Drain ready events in wire form
    #[must_use]
    pub fn poll_events(&self) -> Value {
        self.queue.poll_events_json()
    }

    fn record<T: Serialize>(&self, event: &EventName, value: &T) {
        match serde_json::to_value(value) {
            Ok(data) => self.queue.write_ready(event.as_str(), data),
            Err(err) => self.serialization_failed(event, &err),
        }
    }

    fn serialization_failed(&self, event: &EventName, err: &serde_json::Error) {
        tracing::warn!(event = %event, error = %err, "payload serialization failed");
        self.queue.write_ready(
            EventName::Console(ConsoleLevel::Error).as_str(),
            json!([format!("Failed to serialize {event} event: {err}")]),
        );
    }

    /// Run begin
    pub fn start(&self, start: DateTime<Utc>) {
        self.queue
            .write_ready(EventName::Start.as_str(), json!({ "start": iso(start) }));
    }

    /// Run end, with the run duration in milliseconds
    pub fn end(&self, end: DateTime<Utc>, duration: f64) {
        self.queue.write_ready(
            EventName::End.as_str(),
            json!({ "end": iso(end), "duration": duration }),
        );
    }

    /// Suite begin
    pub fn suite(&self, suite: &SuiteRecord) {
        self.record(&EventName::Suite, suite);
    }

    /// Suite end
    pub fn suite_end(&self) {
        self.queue.write_ready(EventName::SuiteEnd.as_str(), json!({}));
    }

    /// Delay begin
    pub fn waiting(&self) {
        self.queue.write_ready(EventName::Waiting.as_str(), json!({}));
    }

    /// Delay end
    pub fn ready(&self) {
        self.queue.write_ready(EventName::Ready.as_str(), json!({}));
    }

    /// Test passed
    pub fn pass(&self, test: &TestRecord) {
        self.record(&EventName::Pass, test);
    }

    /// Test skipped
    pub fn pending(&self, test: &TestRecord) {
        self.record(&EventName::Pending, test);
    }

    /// Test finished
    pub fn test_end(&self, test: &TestRecord) {
        self.record(&EventName::TestEnd, test);
    }

    /// Test failed; the error is encoded asynchronously into `err`
    pub fn fail(&self, test: &TestRecord, err: HostValue) {
        let event = EventName::Fail;
        let mut data = match serde_json::to_value(test) {
            Ok(data) => data,
            Err(e) => {
                self.serialization_failed(&event, &e);
                return;
            }
        };
        self.queue.write(event.as_str(), async move {
            let encoded = serialize(&err).await;
            if let Value::Object(map) = &mut data {
                map.insert("err".to_string(), encoded);
            }
            data
        });
    }

    /// Captured `console.<level>(...args)`
    pub fn console(&self, level: ConsoleLevel, args: Vec<HostValue>) {
        self.queue
            .write(EventName::Console(level).as_str(), async move {
                serialize_all(&args).await
            });
    }

    /// Top-level error handler.
    ///
    /// The thrown value is transported when there is one; otherwise the
    /// location is folded into a message string.
    pub fn uncaught_error(&self, error: UncaughtError) {
        let args = match error {
            UncaughtError::Thrown(value) => vec![value],
            UncaughtError::Location {
                message,
                file,
                line,
                column,
            } => vec![HostValue::string(format!(
                "{message} at {file}:{line}:{column}"
            ))],
        };
        self.console(ConsoleLevel::Error, args);
    }

    /// Unhandled promise rejection handler
    pub fn unhandled_rejection(&self, reason: HostValue) {
        self.console(
            ConsoleLevel::Error,
            vec![HostValue::string("Unhandled rejection:"), reason],
        );
    }

    /// Framework completion: coverage first when present, then the exit code
    pub fn finish(&self, failures: u32, coverage: Option<Value>) {
        if let Some(coverage) = coverage {
            self.queue
                .write_ready(EventName::Coverage.as_str(), coverage);
        }
        let code = i32::from(failures > 0);
        self.queue
            .write_ready(EventName::Callback.as_str(), json!({ "code": code }));
    }
}

/// What the page's `onerror` handler received
#[derive(Debug, Clone)]
pub enum UncaughtError {
    /// A thrown value
    Thrown(HostValue),
    /// No thrown value, only the reported message and location
    Location {
        /// Error message
        message: String,
        /// Script URL
        file: String,
        /// Line number
        line: u32,
        /// Column number
        column: u32,
    },
}

/// Callback standing in for the framework's run entry point
pub type RunHook = Box<dyn FnOnce(Agent, String) + Send>;

/// Driver backed by an in-process [`Agent`].
///
/// Poll expressions drain the agent's queue, received chunks are buffered,
/// and the run expression hands the assembled bundle to the run hook.
/// Any other script is recorded and evaluates to `null`.
pub struct AgentDriver {
    agent: Agent,
    chunks: Vec<String>,
    on_run: Option<RunHook>,
    scripts: Vec<String>,
    ended: bool,
}

impl fmt::Debug for AgentDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDriver")
            .field("agent", &self.agent)
            .field("chunks", &self.chunks.len())
            .field("scripts", &self.scripts.len())
            .field("ended", &self.ended)
            .finish()
    }
}

impl AgentDriver {
    /// Create a driver whose run expression invokes `on_run`
    pub fn new(agent: Agent, on_run: impl FnOnce(Agent, String) + Send + 'static) -> Self {
        Self {
            agent,
            chunks: Vec::new(),
            on_run: Some(Box::new(on_run)),
            scripts: Vec::new(),
            ended: false,
        }
    }

    /// The agent answering polls
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Scripts evaluated other than polls, receives and the run call
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Bundle text received so far
    #[must_use]
    pub fn bundle(&self) -> String {
        self.chunks.concat()
    }

    /// Whether `end` has been called
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    fn receive(&mut self, argument: &str) -> MochifyResult<()> {
        let chunk: String = serde_json::from_str(argument)
            .map_err(|e| MochifyError::evaluation(format!("bad chunk: {e}")))?;
        self.chunks.push(chunk);
        Ok(())
    }
}

#[async_trait]
impl MochifyDriver for AgentDriver {
    async fn evaluate(&mut self, script: &str) -> MochifyResult<Value> {
        if self.ended {
            return Err(MochifyError::DriverClosed);
        }
        if script == POLL_EXPRESSION {
            return Ok(self.agent.poll_events());
        }
        if script == RUN_EXPRESSION {
            let on_run = self
                .on_run
                .take()
                .ok_or_else(|| MochifyError::evaluation("mochify_run called twice"))?;
            on_run(self.agent.clone(), self.bundle());
            return Ok(Value::Null);
        }
        if let Some(argument) = script
            .strip_prefix(RECEIVE_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            self.receive(argument)?;
            return Ok(Value::Null);
        }
        self.scripts.push(script.to_string());
        Ok(Value::Null)
    }

    async fn end(&mut self) -> MochifyResult<()> {
        self.ended = true;
        Ok(())
    }
}
