//! Mochify: run mocha test bundles in a browser page, report them locally.
//!
//! The page and the host share nothing but an evaluate-in-page primitive.
//! An agent in the page encodes framework events into a FIFO queue; the host
//! polls that queue, decodes each value back into a shadow of the original,
//! maps error stacks through the bundle's source map and replays lifecycle
//! events on a local runner whose reporter prints the results.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── page ────────────────────────┐
//! │  mocha ──► agent (serializer) ──► queue (reserved)   │
//! └──────────────────────────────────────┬───────────────┘
//!                     evaluate(poll) ──► │ [[event, data], ...]
//! ┌──────────────────────── host ────────▼───────────────┐
//! │  pump ──► reconstruct ──► stack mapper               │
//! │    ├──► Runner<R: Reporter> ──► spec / dot / json    │
//! │    ├──► HostConsole (console.*)                      │
//! │    └──► CoverageSlot (mochify.coverage)              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mochify::prelude::*;
//!
//! # async fn demo(bundle: &str) -> MochifyResult<i32> {
//! let mut driver = ChromiumDriver::launch(BrowserConfig::default()).await?;
//! let mut runner = Runner::new(SpecReporter::default());
//! let mut console = StdConsole::new();
//! let code = run(&mut driver, &mut runner, &mut console, bundle, &RunOptions::default()).await?;
//! driver.end().await?;
//! # Ok(code)
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod agent;
pub mod browser;
pub mod console;
pub mod coverage;
pub mod driver;
pub mod encoding;
pub mod event;
pub mod inject;
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod inspect;
pub mod pump;
pub mod queue;
pub mod reconstruct;
pub mod reporter;
mod result;
pub mod run;
pub mod runner;
pub mod serializer;
pub mod shadow;
pub mod source_map;
pub mod stack;
pub mod value;

pub use agent::{Agent, AgentDriver, UncaughtError};
pub use browser::{BrowserConfig, ChromiumDriver};
pub use console::{HostConsole, RecordingConsole, StdConsole};
pub use coverage::CoverageSlot;
pub use driver::{MochifyDriver, MockDriver};
pub use encoding::{ErrorKind, Tag, MAX_DEPTH, POLL_EXPRESSION};
pub use event::{ConsoleLevel, EventName, RunnerEvent, SuiteRecord, TestRecord};
pub use inject::{agent_script, inject, InjectOptions, AGENT_SCRIPT};
pub use inspect::{format_console, inspect, InspectOptions};
pub use pump::{poll_events, PumpOptions};
pub use queue::{EventQueue, QueuedEvent};
pub use reconstruct::Reconstructor;
pub use reporter::{
    DotReporter, JsonReporter, RecordingReporter, Reporter, ReporterKind, SpecReporter,
};
pub use result::{MochifyError, MochifyResult};
pub use run::{run, RunOptions};
pub use runner::{Runner, Stats};
pub use serializer::{serialize, serialize_all};
pub use shadow::Shadow;
pub use source_map::SourceMap;
pub use stack::{StackFrame, StackMapper};
pub use value::HostValue;

/// Everything needed to drive a run
pub mod prelude {
    pub use super::agent::{Agent, AgentDriver, UncaughtError};
    pub use super::browser::{BrowserConfig, ChromiumDriver};
    pub use super::console::{HostConsole, RecordingConsole, StdConsole};
    pub use super::coverage::CoverageSlot;
    pub use super::driver::{MochifyDriver, MockDriver};
    pub use super::event::{ConsoleLevel, RunnerEvent, TestRecord};
    pub use super::reporter::{
        DotReporter, JsonReporter, RecordingReporter, Reporter, ReporterKind, SpecReporter,
    };
    pub use super::result::{MochifyError, MochifyResult};
    pub use super::run::{run, RunOptions};
    pub use super::runner::{Runner, Stats};
    pub use super::value::HostValue;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;

        #[test]
        fn test_mochify_error_display() {
            let err = MochifyError::BrowserNotFound;
            assert!(err.to_string().contains("Browser"));
            let err = MochifyError::evaluation("boom");
            assert!(err.to_string().contains("boom"));
        }
    }

    mod prelude_tests {
        use crate::prelude::*;

        #[tokio::test]
        async fn test_prelude_covers_a_run() {
            let mut driver = AgentDriver::new(Agent::new(), |agent, _| agent.finish(0, None));
            let mut runner = Runner::new(RecordingReporter::default());
            let mut console = RecordingConsole::new();
            let options =
                RunOptions::default().with_coverage(std::sync::Arc::new(CoverageSlot::new()));
            let code = run(&mut driver, &mut runner, &mut console, "", &options)
                .await
                .unwrap();
            assert_eq!(code, 0);
        }
    }
}
