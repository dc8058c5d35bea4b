//! Driver contract: the two page operations the pipeline consumes.
//!
//! ```text
//! ┌──────────────┐  evaluate(script) -> JSON   ┌────────────────┐
//! │  run / pump  │ ──────────────────────────► │  MochifyDriver │
//! │              │  end()                      │  (page owner)  │
//! └──────────────┘                             └────────────────┘
//!                                                 ├── ChromiumDriver (feature = "browser")
//!                                                 ├── AgentDriver    (in-process page)
//!                                                 └── MockDriver     (scripted replies)
//! ```

use crate::encoding::POLL_EXPRESSION;
use crate::result::{MochifyError, MochifyResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;

/// Page owner used by the pipeline
#[async_trait]
pub trait MochifyDriver: Send {
    /// Run `script` in the page's global scope and return its value as JSON
    async fn evaluate(&mut self, script: &str) -> MochifyResult<Value>;

    /// Release the page
    async fn end(&mut self) -> MochifyResult<()>;
}

#[async_trait]
impl<D: MochifyDriver + ?Sized> MochifyDriver for Box<D> {
    async fn evaluate(&mut self, script: &str) -> MochifyResult<Value> {
        (**self).evaluate(script).await
    }

    async fn end(&mut self) -> MochifyResult<()> {
        (**self).end().await
    }
}

/// Driver answering polls from a script of canned batches
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Replies handed out to successive polls; `null` once exhausted
    pub poll_replies: VecDeque<Value>,
    /// Every script evaluated, in order
    pub call_history: Vec<String>,
    /// Whether `end` has been called
    pub ended: bool,
}

impl MockDriver {
    /// Create a driver with no canned replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next unanswered poll
    pub fn push_poll(&mut self, reply: Value) {
        self.poll_replies.push_back(reply);
    }

    /// Builder form of [`push_poll`](Self::push_poll)
    #[must_use]
    pub fn with_poll(mut self, reply: Value) -> Self {
        self.push_poll(reply);
        self
    }

    /// Scripts evaluated so far
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Number of polls made
    #[must_use]
    pub fn poll_count(&self) -> usize {
        self.call_history
            .iter()
            .filter(|script| *script == POLL_EXPRESSION)
            .count()
    }
}

#[async_trait]
impl MochifyDriver for MockDriver {
    async fn evaluate(&mut self, script: &str) -> MochifyResult<Value> {
        if self.ended {
            return Err(MochifyError::DriverClosed);
        }
        self.call_history.push(script.to_string());
        if script == POLL_EXPRESSION {
            return Ok(self.poll_replies.pop_front().unwrap_or(Value::Null));
        }
        Ok(Value::Null)
    }

    async fn end(&mut self) -> MochifyResult<()> {
        self.ended = true;
        Ok(())
    }
}
