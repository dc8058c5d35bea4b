//! Process-wide coverage slot.
//!
//! The page reports its coverage object once, just before the terminal
//! callback. Downstream tooling picks it up from [`CoverageSlot::global`].

use crate::value::lock;
use serde_json::Value;
use std::sync::{Arc, Mutex, OnceLock};

/// Holds the most recent coverage report
#[derive(Debug, Default)]
pub struct CoverageSlot {
    data: Mutex<Option<Value>>,
}

impl CoverageSlot {
    /// Create an empty, private slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot shared by the whole process
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<CoverageSlot>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Store a report, replacing one left over from a previous run
    pub fn store(&self, data: Value) {
        let mut slot = lock(&self.data);
        if slot.is_some() {
            tracing::debug!("replacing coverage from a previous run");
        }
        *slot = Some(data);
    }

    /// Copy of the stored report
    #[must_use]
    pub fn get(&self) -> Option<Value> {
        lock(&self.data).clone()
    }

    /// Remove and return the stored report
    pub fn take(&self) -> Option<Value> {
        lock(&self.data).take()
    }

    /// Whether a report is stored
    #[must_use]
    pub fn is_set(&self) -> bool {
        lock(&self.data).is_some()
    }
}
