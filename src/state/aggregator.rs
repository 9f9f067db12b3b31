use crate::entity::EntityKey;
use crate::state::entity::{Attributes, ChangeRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Key-deduplicating buffer for one throttle window
///
/// Last write for a key fully replaces the earlier one; nothing is merged.
#[derive(Debug, Default)]
pub struct Aggregator {
    buffer: BTreeMap<EntityKey, Attributes>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, record: ChangeRecord) {
        if self.buffer.insert(record.key.clone(), record.attributes).is_some() {
            debug!(entity_id = %record.key, "Replaced buffered update");
        }
    }

    /// Take every buffered entry (key order) and leave the buffer empty
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.buffer)
            .into_iter()
            .map(|(key, attributes)| ChangeRecord::new(key, attributes))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything without sending it
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
