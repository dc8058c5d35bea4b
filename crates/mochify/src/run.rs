//! One complete run: source map, injection, then the pump.

use crate::console::HostConsole;
use crate::coverage::CoverageSlot;
use crate::driver::MochifyDriver;
use crate::inject::{inject, InjectOptions, DEFAULT_CHUNK_SIZE};
use crate::pump::{poll_events, PumpOptions};
use crate::reconstruct::Reconstructor;
use crate::reporter::Reporter;
use crate::result::MochifyResult;
use crate::runner::Runner;
use crate::source_map;
use crate::stack::StackMapper;
use std::sync::Arc;
use std::time::Duration;

/// Run configuration
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Framework interface
    pub ui: String,
    /// Per-test timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum bytes per bundle chunk
    pub chunk_size: usize,
    /// Pause between empty polls
    pub idle_delay: Option<Duration>,
    /// Framework source injected ahead of the agent
    pub framework_script: Option<String>,
    /// Coverage destination
    pub coverage: Arc<CoverageSlot>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ui: "bdd".to_string(),
            timeout_ms: 2000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            idle_delay: None,
            framework_script: None,
            coverage: CoverageSlot::global(),
        }
    }
}

impl RunOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the framework interface
    #[must_use]
    pub fn with_ui(mut self, ui: impl Into<String>) -> Self {
        self.ui = ui.into();
        self
    }

    /// Set the per-test timeout
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the bundle chunk size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the pause between empty polls
    #[must_use]
    pub fn with_idle_delay(mut self, delay: Option<Duration>) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Inject a framework script ahead of the agent
    #[must_use]
    pub fn with_framework_script(mut self, script: impl Into<String>) -> Self {
        self.framework_script = Some(script.into());
        self
    }

    /// Use a private coverage slot instead of the global one
    #[must_use]
    pub fn with_coverage(mut self, coverage: Arc<CoverageSlot>) -> Self {
        self.coverage = coverage;
        self
    }

    fn inject_options(&self) -> InjectOptions {
        InjectOptions {
            ui: self.ui.clone(),
            timeout_ms: self.timeout_ms,
            chunk_size: self.chunk_size,
            framework_script: self.framework_script.clone(),
        }
    }
}

/// Stack mapper for `script` plus the script with its map comment removed.
///
/// An unreadable source map is logged and the run continues unmapped.
pub fn prepare_script(script: &str) -> (Option<StackMapper>, String) {
    match StackMapper::from_script(script) {
        Ok(Some(mapper)) => (Some(mapper), source_map::remove_comments(script)),
        Ok(None) => (None, script.to_string()),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable source map");
            (None, source_map::remove_comments(script))
        }
    }
}

/// Run `script` in the page behind `driver` and return the exit code
pub async fn run<D, R, C>(
    driver: &mut D,
    runner: &mut Runner<R>,
    console: &mut C,
    script: &str,
    options: &RunOptions,
) -> MochifyResult<i32>
where
    D: MochifyDriver + ?Sized,
    R: Reporter,
    C: HostConsole + ?Sized,
{
    let (mapper, script) = prepare_script(script);
    tracing::debug!(mapped = mapper.is_some(), "prepared bundle");

    inject(driver, &script, &options.inject_options()).await?;

    let pump = PumpOptions::default()
        .with_reconstructor(Reconstructor::new(mapper))
        .with_coverage(Arc::clone(&options.coverage))
        .with_idle_delay(options.idle_delay);
    poll_events(driver, runner, console, &pump).await
}
