// Batch dispatch and the transport seam
//
// All buffering and throttling happens here, synchronously on the tick
// thread. The transport only ever sees finished JSON bodies.

use crate::event::{HubEvent, HubEventError};
use crate::state::{Aggregator, ChangeRecord};
use crate::throttle::UpdateThrottle;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};


/// Relative path of the batched entity update service
pub const MULTI_ENTITY_PATH: &str = "/services/runelite/set_multi_entity_data";

/// Relative path of a one-shot service
pub fn service_path(service: &str) -> String {
    format!("/services/runelite/{}", service)
}

/// Outcome of handing a body to the transport
#[derive(Debug)]
pub enum Submission {
    /// Base URL or token missing; nothing was sent
    NotConfigured,
    /// Handled synchronously (no network involved)
    Completed,
    /// In flight; the handle only resolves after the outcome has been logged
    Pending(JoinHandle<()>),
}

impl Submission {
    pub fn is_sent(&self) -> bool {
        !matches!(self, Submission::NotConfigured)
    }
}

/// Fire-and-forget POST of a JSON body to a path relative to the hub API.
///
/// Implementations must never block the caller.
pub trait Transport: Send + Sync {
    fn post(&self, path: &str, body: Value) -> Submission;
}

/// Wrap drained records as `{"entities": [...]}`
pub fn batch_body(records: &[ChangeRecord]) -> Value {
    json!({ "entities": records })
}

/// Transport that keeps every request in memory (dry runs, tests)
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every (path, body) posted so far
    pub fn requests(&self) -> Vec<(String, Value)> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Remove and return everything posted so far
    pub fn take(&self) -> Vec<(String, Value)> {
        match self.requests.lock() {
            Ok(mut requests) => std::mem::take(&mut *requests),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Transport for RecordingTransport {
    fn post(&self, path: &str, body: Value) -> Submission {
        match self.requests.lock() {
            Ok(mut requests) => requests.push((path.to_string(), body)),
            Err(poisoned) => poisoned.into_inner().push((path.to_string(), body)),
        }
        Submission::Completed
    }
}

/// Throttled batch dispatcher plus the unthrottled event path
pub struct Dispatcher {
    aggregator: Aggregator,
    throttle: UpdateThrottle,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, throttle_ticks: u32) -> Self {
        Self {
            aggregator: Aggregator::new(),
            throttle: UpdateThrottle::new(throttle_ticks),
            transport,
        }
    }

    /// Buffer a change for the current window
    pub fn accept(&mut self, record: ChangeRecord) {
        self.aggregator.accept(record);
    }

    /// Advance the throttle; flush the buffer when the window has elapsed.
    ///
    /// Returns the submission when a non-empty batch was handed over.
    pub fn on_tick(&mut self) -> Option<Submission> {
        if self.throttle.tick() {
            self.flush_now()
        } else {
            None
        }
    }

    /// Drain and send whatever is buffered, ignoring the throttle
    pub fn flush_now(&mut self) -> Option<Submission> {
        let records = self.aggregator.drain();
        if records.is_empty() {
            return None;
        }

        debug!(entities = records.len(), "Flushing entity batch");
        Some(self.transport.post(MULTI_ENTITY_PATH, batch_body(&records)))
    }

    /// Send a set of records as their own batch right away, leaving the
    /// buffer and the throttle untouched
    pub fn send_batch(&self, records: &[ChangeRecord]) -> Option<Submission> {
        if records.is_empty() {
            return None;
        }
        Some(self.transport.post(MULTI_ENTITY_PATH, batch_body(records)))
    }

    /// Post a one-shot event, bypassing buffer and throttle
    pub fn send_immediate(&self, event: &HubEvent) -> Result<Submission, HubEventError> {
        if let Err(e) = event.validate() {
            warn!(service = %event.service, error = %e, "Dropping invalid hub event");
            return Err(e);
        }

        debug!(service = %event.service, "Sending hub event");
        Ok(self
            .transport
            .post(&service_path(&event.service), Value::Object(event.payload.clone())))
    }

    pub fn set_throttle(&mut self, ticks: u32) {
        self.throttle.set_threshold(ticks);
    }

    /// Start a fresh window with an empty buffer
    pub fn reset(&mut self) {
        self.aggregator.clear();
        self.throttle.reset();
    }

    pub fn pending(&self) -> usize {
        self.aggregator.len()
    }
}
