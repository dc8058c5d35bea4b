//! JSON reporter: a single document written when the run ends.

use super::Reporter;
use crate::event::{RunnerEvent, TestRecord};
use crate::result::MochifyResult;
use crate::runner::Stats;
use crate::shadow::Shadow;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanTest {
    title: String,
    full_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    current_retry: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<crate::event::Speed>,
    err: Value,
}

#[derive(Debug, Serialize)]
struct Document<'a> {
    stats: &'a Stats,
    tests: &'a [CleanTest],
    pending: &'a [CleanTest],
    failures: &'a [CleanTest],
    passes: &'a [CleanTest],
}

/// Own properties of an error, including `message` and `stack`
fn error_json(err: &Shadow) -> Value {
    match err {
        Shadow::Error(error) => {
            let mut map = Map::new();
            if let Some(stack) = &error.stack {
                map.insert("stack".into(), Value::String(stack.clone()));
            }
            map.insert("message".into(), Value::String(error.message.clone()));
            for (key, value) in &error.props.keys {
                if let Some(json) = value.to_json() {
                    map.insert(key.clone(), json);
                }
            }
            Value::Object(map)
        }
        other => other.to_json().unwrap_or(Value::Null),
    }
}

/// Collects tests by outcome and prints them as one JSON document
#[derive(Debug)]
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
    errors: HashMap<String, Value>,
    tests: Vec<CleanTest>,
    pending: Vec<CleanTest>,
    failures: Vec<CleanTest>,
    passes: Vec<CleanTest>,
}

impl Default for JsonReporter<io::Stdout> {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    /// Create a reporter writing to `out`
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            errors: HashMap::new(),
            tests: Vec::new(),
            pending: Vec::new(),
            failures: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn clean(&self, test: &TestRecord) -> CleanTest {
        CleanTest {
            title: test.title.clone(),
            full_title: test.full_title().to_string(),
            duration: test.duration,
            current_retry: test.current_retry(),
            speed: test.speed,
            err: self
                .errors
                .get(test.full_title())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn on_event(&mut self, event: &RunnerEvent, stats: &Stats) -> MochifyResult<()> {
        match event {
            RunnerEvent::TestEnd(test) => {
                let clean = self.clean(test);
                self.tests.push(clean);
            }
            RunnerEvent::TestPass(test) => {
                let clean = self.clean(test);
                self.passes.push(clean);
            }
            RunnerEvent::TestPending(test) => {
                let clean = self.clean(test);
                self.pending.push(clean);
            }
            RunnerEvent::TestFail(test, err) => {
                self.errors
                    .insert(test.full_title().to_string(), error_json(err));
                let clean = self.clean(test);
                self.failures.push(clean);
            }
            RunnerEvent::End(_) => {
                let document = Document {
                    stats,
                    tests: &self.tests,
                    pending: &self.pending,
                    failures: &self.failures,
                    passes: &self.passes,
                };
                serde_json::to_writer_pretty(&mut self.out, &document)?;
                writeln!(self.out)?;
                self.out.flush()?;
            }
            RunnerEvent::Start(_)
            | RunnerEvent::SuiteBegin(_)
            | RunnerEvent::SuiteEnd(_)
            | RunnerEvent::DelayBegin(_)
            | RunnerEvent::DelayEnd(_) => {}
        }
        Ok(())
    }
}
