//! FIFO event queue with reserved slots.
//!
//! ```text
//! write("console.log", slow)   ->  [console.log, null, <task>]   pending
//! write_ready("pass", data)    ->  [pass, data]                   ready
//!
//! poll_events()                ->  None (head is pending)
//! ... slow task completes ...
//! poll_events()                ->  Some([[console.log, ..], [pass, ..]])
//! ```
//!
//! A slot keeps its position from the moment it is written, so an event whose
//! payload takes longer to encode still blocks everything behind it.

use crate::encoding::{tagged, Tag};
use crate::value::lock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A drained `(event, payload)` pair; on the wire it is `[event, payload]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Value)", into = "(String, Value)")]
pub struct QueuedEvent {
    /// Event name
    pub event: String,
    /// Encoded payload
    pub data: Value,
}

impl QueuedEvent {
    /// Create a new event record
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

impl From<(String, Value)> for QueuedEvent {
    fn from((event, data): (String, Value)) -> Self {
        Self { event, data }
    }
}

impl From<QueuedEvent> for (String, Value) {
    fn from(event: QueuedEvent) -> Self {
        (event.event, event.data)
    }
}

#[derive(Debug)]
struct Slot {
    id: u64,
    event: String,
    data: Option<Value>,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    slots: VecDeque<Slot>,
}

impl QueueState {
    fn reserve(&mut self, event: String, data: Option<Value>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.push_back(Slot { id, event, data });
        id
    }
}

/// Single-producer, single-consumer event buffer
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    state: Arc<Mutex<QueueState>>,
}

impl EventQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `event` and fill it once `payload` resolves.
    ///
    /// Must be called from within a tokio runtime.
    pub fn write<F>(&self, event: impl Into<String>, payload: F)
    where
        F: Future<Output = Value> + Send + 'static,
    {
        let event = event.into();
        let id = lock(&self.state).reserve(event.clone(), None);
        let queue = self.clone();
        tokio::spawn(async move {
            match tokio::spawn(payload).await {
                Ok(data) => queue.complete(id, None, data),
                Err(err) => {
                    tracing::warn!(event = %event, error = %err, "payload serialization failed");
                    let message = format!("Failed to serialize {event} event: {err}");
                    let data = Value::Array(vec![tagged(Tag::String, [Value::String(message)])]);
                    queue.complete(id, Some("console.error".to_string()), data);
                }
            }
        });
    }

    /// Append an event whose payload is already encoded
    pub fn write_ready(&self, event: impl Into<String>, data: Value) {
        lock(&self.state).reserve(event.into(), Some(data));
    }

    fn complete(&self, id: u64, rename: Option<String>, data: Value) {
        let mut state = lock(&self.state);
        if let Some(slot) = state.slots.iter_mut().find(|slot| slot.id == id) {
            if let Some(event) = rename {
                slot.event = event;
            }
            slot.data = Some(data);
        }
    }

    /// Drain the ready prefix.
    ///
    /// Returns `None` when the queue is empty or its head is still pending.
    pub fn poll_events(&self) -> Option<Vec<QueuedEvent>> {
        let mut state = lock(&self.state);
        if !state.slots.front().is_some_and(|slot| slot.data.is_some()) {
            return None;
        }
        let mut drained = Vec::new();
        while state.slots.front().is_some_and(|slot| slot.data.is_some()) {
            if let Some(Slot {
                event,
                data: Some(data),
                ..
            }) = state.slots.pop_front()
            {
                drained.push(QueuedEvent { event, data });
            }
        }
        Some(drained)
    }

    /// [`poll_events`](Self::poll_events) in wire form: `null` or an event array
    pub fn poll_events_json(&self) -> Value {
        self.poll_events().map_or(Value::Null, |events| {
            Value::Array(
                events
                    .into_iter()
                    .map(|e| Value::Array(vec![Value::String(e.event), e.data]))
                    .collect(),
            )
        })
    }

    /// Number of slots, pending or ready
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).slots.len()
    }

    /// Whether no slots are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots still waiting for their payload
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.state)
            .slots
            .iter()
            .filter(|slot| slot.data.is_none())
            .count()
    }
}
