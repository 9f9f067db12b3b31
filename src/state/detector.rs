use crate::entity::EntityKey;
use crate::state::entity::{Attributes, ChangeRecord, Snapshot};
use serde_json::Value;
use std::collections::BTreeMap;

static NULL: Value = Value::Null;

/// Per-tracker diff against the last emitted state
///
/// `detect` never mutates; the caller commits each record once it has been
/// accepted downstream, so "previous" only ever holds emitted values.
/// A missing attribute and an explicit `null` compare equal.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: BTreeMap<EntityKey, Attributes>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changed attributes per entity in `current`, in key order.
    ///
    /// Attributes that disappeared since the last emission come back as
    /// `null`. Entities whose attributes are all unchanged produce nothing.
    pub fn detect(&self, current: &Snapshot) -> Vec<ChangeRecord> {
        let empty = Attributes::new();
        let mut records = Vec::new();

        for (key, attributes) in current {
            let previous = self.previous.get(key).unwrap_or(&empty);
            let mut changed = Attributes::new();

            for (name, value) in attributes {
                if previous.get(name).unwrap_or(&NULL) != value {
                    changed.insert(name.clone(), value.clone());
                }
            }
            for name in previous.keys() {
                if !attributes.contains_key(name) {
                    changed.insert(name.clone(), Value::Null);
                }
            }

            if !changed.is_empty() {
                records.push(ChangeRecord::new(key.clone(), changed));
            }
        }

        records
    }

    /// Fold an accepted record into the last emitted state
    pub fn commit(&mut self, record: &ChangeRecord) {
        let entry = self.previous.entry(record.key.clone()).or_default();
        for (name, value) in &record.attributes {
            if value.is_null() {
                entry.remove(name);
            } else {
                entry.insert(name.clone(), value.clone());
            }
        }
    }

    /// Forget entities that are no longer observed, so they are sent in full
    /// when they reappear
    pub fn retain_observed(&mut self, current: &Snapshot) {
        self.previous.retain(|key, _| current.contains_key(key));
    }

    /// Last emitted attributes for one entity
    pub fn previous(&self, key: &EntityKey) -> Option<&Attributes> {
        self.previous.get(key)
    }

    pub fn clear(&mut self) {
        self.previous.clear();
    }
}
