use crate::entity::EntityKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name -> value for one entity
pub type Attributes = BTreeMap<String, Value>;

/// Everything one tracker observed in a single cycle, keyed by entity
pub type Snapshot = BTreeMap<EntityKey, Attributes>;

/// Attributes of one entity that differ from what was last emitted
///
/// Serializes flat: `{"entity_id": "...", "<attr>": <value>, ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "entity_id")]
    pub key: EntityKey,

    #[serde(flatten)]
    pub attributes: Attributes,
}

impl ChangeRecord {
    pub fn new(key: EntityKey, attributes: Attributes) -> Self {
        Self { key, attributes }
    }
}
