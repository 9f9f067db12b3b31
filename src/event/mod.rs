use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod validation;
#[cfg(test)]
mod tests;

pub use validation::{validate, HubEventError};

/// Well-known one-shot services exposed by the hub integration
pub mod services {
    pub const IDLE: &str = "trigger_idle_notify";
    pub const VARBIT_CHANGE: &str = "trigger_varbit_change_notify";
    pub const COLLECTION_LOG: &str = "trigger_collection_log_notify";
    pub const ACHIEVEMENT_DIARY: &str = "trigger_achievement_diary_notify";
    pub const COMBAT_TASK: &str = "trigger_combat_task_notify";
}

/// HubEvent is a one-shot lifecycle notification.
///
/// Events bypass change detection and the throttle window; they are posted
/// to `/services/runelite/{service}` with `payload` as a flat JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    /// Hub service name (e.g., "trigger_idle_notify")
    /// Must be lowercase with optional underscores
    pub service: String,

    /// Flat attribute mapping sent as the request body
    pub payload: Map<String, Value>,
}

impl HubEvent {
    /// Create an event with an empty payload
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            payload: Map::new(),
        }
    }

    /// Builder-style attribute insertion
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(name.to_string(), value.into());
        self
    }

    /// Validates the service name before it becomes part of a URL path.
    pub fn validate(&self) -> Result<(), HubEventError> {
        validation::validate(self)
    }
}
