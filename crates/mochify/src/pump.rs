//! Event pump: polls the page and dispatches drained events.
//!
//! ```text
//! loop {
//!   evaluate(POLL_EXPRESSION)
//!     null            -> yield, poll again
//!     [[name, data]]  -> mochify.callback  -> return code
//!                        mochify.coverage  -> coverage slot
//!                        console.<level>   -> host console
//!                        lifecycle         -> Runner::emit
//!                        anything else     -> console.error
//! }
//! ```

use crate::console::HostConsole;
use crate::coverage::CoverageSlot;
use crate::driver::MochifyDriver;
use crate::encoding::POLL_EXPRESSION;
use crate::event::{ConsoleLevel, EventName, RunnerEvent};
use crate::reconstruct::Reconstructor;
use crate::reporter::Reporter;
use crate::result::{MochifyError, MochifyResult};
use crate::runner::Runner;
use crate::shadow::Shadow;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Settings for [`poll_events`]
#[derive(Debug, Clone)]
pub struct PumpOptions {
    /// Decoder for console arguments and failure errors
    pub reconstructor: Reconstructor,
    /// Where `mochify.coverage` payloads go
    pub coverage: Arc<CoverageSlot>,
    /// Pause between empty polls; `None` yields to the runtime once
    pub idle_delay: Option<Duration>,
}

impl Default for PumpOptions {
    fn default() -> Self {
        Self {
            reconstructor: Reconstructor::default(),
            coverage: CoverageSlot::global(),
            idle_delay: None,
        }
    }
}

impl PumpOptions {
    /// Set the reconstructor
    #[must_use]
    pub fn with_reconstructor(mut self, reconstructor: Reconstructor) -> Self {
        self.reconstructor = reconstructor;
        self
    }

    /// Set the coverage slot
    #[must_use]
    pub fn with_coverage(mut self, coverage: Arc<CoverageSlot>) -> Self {
        self.coverage = coverage;
        self
    }

    /// Set the pause between empty polls
    #[must_use]
    pub fn with_idle_delay(mut self, delay: Option<Duration>) -> Self {
        self.idle_delay = delay;
        self
    }
}

async fn idle(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => tokio::task::yield_now().await,
    }
}

fn exit_code(data: &Value) -> i32 {
    let code = data.get("code");
    code.and_then(Value::as_i64)
        .or_else(|| code.and_then(Value::as_f64).map(|n| n as i64))
        .map_or(0, |n| n as i32)
}

fn report_anomaly<C: HostConsole + ?Sized>(console: &mut C, message: String) -> MochifyResult<()> {
    console.write(ConsoleLevel::Error, &[Shadow::string(message)])
}

/// Poll until the page reports completion and return its exit code
pub async fn poll_events<D, R, C>(
    driver: &mut D,
    runner: &mut Runner<R>,
    console: &mut C,
    options: &PumpOptions,
) -> MochifyResult<i32>
where
    D: MochifyDriver + ?Sized,
    R: Reporter,
    C: HostConsole + ?Sized,
{
    loop {
        let batch = match driver.evaluate(POLL_EXPRESSION).await? {
            Value::Null => {
                idle(options.idle_delay).await;
                continue;
            }
            Value::Array(batch) => batch,
            other => {
                return Err(MochifyError::protocol(format!(
                    "poll returned {other}, expected an event array or null"
                )))
            }
        };
        tracing::debug!(events = batch.len(), "drained batch");

        for entry in &batch {
            let Some((name, data)) = entry
                .as_array()
                .filter(|pair| pair.len() == 2)
                .and_then(|pair| Some((pair[0].as_str()?, &pair[1])))
            else {
                tracing::warn!(entry = %entry, "malformed event entry");
                report_anomaly(console, format!("Malformed event: {entry}"))?;
                continue;
            };

            match EventName::parse(name) {
                EventName::Callback => {
                    let code = exit_code(data);
                    tracing::debug!(code, "run finished");
                    return Ok(code);
                }
                EventName::Coverage => options.coverage.store(data.clone()),
                EventName::Console(level) => {
                    let args = options.reconstructor.reconstruct_args(data);
                    console.write(level, &args)?;
                }
                EventName::Unknown(name) => {
                    tracing::warn!(event = %name, "unknown event");
                    report_anomaly(console, format!("Unknown event \"{name}\": {data}"))?;
                }
                lifecycle => {
                    match RunnerEvent::decode(&lifecycle, data, &options.reconstructor) {
                        Ok(Some(event)) => runner.emit(&event)?,
                        Ok(None) => {}
                        Err(err) => {
                            tracing::warn!(event = %lifecycle, error = %err, "undecodable event");
                            report_anomaly(console, err.to_string())?;
                        }
                    }
                }
            }
        }

        idle(options.idle_delay).await;
    }
}
