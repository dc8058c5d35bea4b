//! Script injection: framework, agent, bundle chunks, then the run call.

use crate::driver::MochifyDriver;
use crate::result::MochifyResult;
use serde_json::Value;

/// The in-page agent, with ui and timeout placeholders
pub const AGENT_SCRIPT: &str = include_str!("../js/agent.js");

/// Start of every chunk-delivery expression; the JSON string follows
pub const RECEIVE_PREFIX: &str = "mocha.mochify_receive(";

/// Expression that injects the received bundle and starts the run
pub const RUN_EXPRESSION: &str = "mocha.mochify_run()";

/// Default bundle chunk size, in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

const UI_PLACEHOLDER: &str = "/* MOCHIFY_UI */";
const TIMEOUT_PLACEHOLDER: &str = "/* MOCHIFY_TIMEOUT */";

/// What gets injected before the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectOptions {
    /// Framework interface (`bdd`, `tdd`, ...)
    pub ui: String,
    /// Per-test timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum bytes per `mochify_receive` call
    pub chunk_size: usize,
    /// Framework source evaluated ahead of the agent
    pub framework_script: Option<String>,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            ui: "bdd".to_string(),
            timeout_ms: 2000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            framework_script: None,
        }
    }
}

/// Agent source with the placeholders replaced by JSON literals
#[must_use]
pub fn agent_script(ui: &str, timeout_ms: u64) -> String {
    AGENT_SCRIPT
        .replace(UI_PLACEHOLDER, &Value::String(ui.to_string()).to_string())
        .replace(TIMEOUT_PLACEHOLDER, &timeout_ms.to_string())
}

/// Split `script` into chunks of at most `chunk_size` bytes on char boundaries
#[must_use]
pub fn chunks(script: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(4);
    let mut parts = Vec::new();
    let mut rest = script;
    while !rest.is_empty() {
        let mut end = chunk_size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        parts.push(head);
        rest = tail;
    }
    parts
}

/// One `mochify_receive` expression per chunk
#[must_use]
pub fn receive_calls(script: &str, chunk_size: usize) -> Vec<String> {
    chunks(script, chunk_size)
        .into_iter()
        .map(|chunk| format!("{RECEIVE_PREFIX}{})", Value::String(chunk.to_string())))
        .collect()
}

/// Inject everything and start the run
pub async fn inject<D: MochifyDriver + ?Sized>(
    driver: &mut D,
    script: &str,
    options: &InjectOptions,
) -> MochifyResult<()> {
    if let Some(framework) = &options.framework_script {
        driver.evaluate(framework).await?;
    }
    driver
        .evaluate(&agent_script(&options.ui, options.timeout_ms))
        .await?;
    let calls = receive_calls(script, options.chunk_size);
    tracing::info!(
        bytes = script.len(),
        chunks = calls.len(),
        ui = %options.ui,
        "injecting bundle"
    );
    for call in &calls {
        driver.evaluate(call).await?;
    }
    driver.evaluate(RUN_EXPRESSION).await?;
    Ok(())
}
