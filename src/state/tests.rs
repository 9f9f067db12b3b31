use super::*;
use crate::entity::{EntityKey, PlayerId};
use serde_json::{json, Value};

fn key(suffix: &str) -> EntityKey {
    let player = PlayerId::from_display_name("Zezima").unwrap();
    EntityKey::new(&player, suffix)
}

fn attrs(pairs: &[(&str, Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn snapshot(entries: Vec<(EntityKey, Attributes)>) -> Snapshot {
    entries.into_iter().collect()
}

/// Detect and commit everything, as the pipeline does on accept
fn emit(detector: &mut ChangeDetector, current: &Snapshot) -> Vec<ChangeRecord> {
    let records = detector.detect(current);
    for record in &records {
        detector.commit(record);
    }
    records
}

#[test]
fn test_first_observation_reports_everything() {
    let detector = ChangeDetector::new();
    let current = snapshot(vec![(
        key("health"),
        attrs(&[("current_health", json!(99))]),
    )]);

    let records = detector.detect(&current);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, key("health"));
    assert_eq!(records[0].attributes.get("current_health"), Some(&json!(99)));
}

#[test]
fn test_equal_snapshots_emit_nothing() {
    let mut detector = ChangeDetector::new();
    let current = snapshot(vec![(
        key("status_effects"),
        attrs(&[(
            "current_status_effects",
            json!([{"name": "poison", "number": 6, "time": -1}]),
        )]),
    )]);

    assert_eq!(emit(&mut detector, &current).len(), 1);
    assert!(emit(&mut detector, &current.clone()).is_empty());
}

#[test]
fn test_only_changed_attributes_reported() {
    let mut detector = ChangeDetector::new();
    let first = snapshot(vec![(
        key("aggression"),
        attrs(&[("status", json!("active")), ("seconds", json!(570)), ("ticks", json!(950))]),
    )]);
    emit(&mut detector, &first);

    let second = snapshot(vec![(
        key("aggression"),
        attrs(&[("status", json!("active")), ("seconds", json!(540)), ("ticks", json!(900))]),
    )]);
    let records = emit(&mut detector, &second);

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].attributes,
        attrs(&[("seconds", json!(540)), ("ticks", json!(900))])
    );
}

#[test]
fn test_uncommitted_change_is_detected_again() {
    let mut detector = ChangeDetector::new();
    let first = snapshot(vec![(key("prayer"), attrs(&[("current_prayer", json!(70))]))]);
    emit(&mut detector, &first);

    let second = snapshot(vec![(key("prayer"), attrs(&[("current_prayer", json!(69))]))]);
    assert_eq!(detector.detect(&second).len(), 1);
    // Not committed, so still different from the last emitted value
    assert_eq!(detector.detect(&second).len(), 1);
}

#[test]
fn test_oscillation_back_to_emitted_value_is_silent() {
    let mut detector = ChangeDetector::new();
    let reported = snapshot(vec![(key("run_energy"), attrs(&[("run_energy", json!(100))]))]);
    emit(&mut detector, &reported);

    // Computed but never accepted, then settles back
    let dip = snapshot(vec![(key("run_energy"), attrs(&[("run_energy", json!(99))]))]);
    assert_eq!(detector.detect(&dip).len(), 1);
    assert!(detector.detect(&reported).is_empty());
}

#[test]
fn test_removed_attribute_reported_as_null() {
    let mut detector = ChangeDetector::new();
    let first = snapshot(vec![(
        key("herb_patch"),
        attrs(&[("status", json!("in_progress")), ("completion_time", json!("2023-11-14T22:13:20Z"))]),
    )]);
    emit(&mut detector, &first);

    let second = snapshot(vec![(key("herb_patch"), attrs(&[("status", json!("ready"))]))]);
    let records = emit(&mut detector, &second);
    assert_eq!(
        records[0].attributes,
        attrs(&[("completion_time", Value::Null), ("status", json!("ready"))])
    );

    // Committing the null forgets the attribute
    assert_eq!(
        detector.previous(&key("herb_patch")),
        Some(&attrs(&[("status", json!("ready"))]))
    );
    assert!(emit(&mut detector, &second).is_empty());
}

#[test]
fn test_retain_observed_forgets_missing_entities() {
    let mut detector = ChangeDetector::new();
    let both = snapshot(vec![
        (key("health"), attrs(&[("current_health", json!(10))])),
        (key("prayer"), attrs(&[("current_prayer", json!(20))])),
    ]);
    emit(&mut detector, &both);

    let health_only = snapshot(vec![(key("health"), attrs(&[("current_health", json!(10))]))]);
    assert!(detector.detect(&health_only).is_empty());
    detector.retain_observed(&health_only);
    assert!(detector.previous(&key("prayer")).is_none());

    // Reappearing entity is sent in full
    assert_eq!(emit(&mut detector, &both).len(), 1);
}

#[test]
fn test_aggregator_last_write_wins_without_merge() {
    let mut aggregator = Aggregator::new();
    aggregator.accept(ChangeRecord::new(
        key("herb_patch"),
        attrs(&[("status", json!("ready")), ("completion_time", json!("x"))]),
    ));
    aggregator.accept(ChangeRecord::new(key("herb_patch"), attrs(&[("status", json!("other"))])));

    let drained = aggregator.drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].attributes, attrs(&[("status", json!("other"))]));
}

#[test]
fn test_aggregator_one_entry_per_key() {
    let mut aggregator = Aggregator::new();
    for value in 0..5 {
        aggregator.accept(ChangeRecord::new(key("health"), attrs(&[("current_health", json!(value))])));
        aggregator.accept(ChangeRecord::new(key("prayer"), attrs(&[("current_prayer", json!(value))])));
    }
    assert_eq!(aggregator.len(), 2);

    let drained = aggregator.drain();
    assert_eq!(drained.len(), 2);
    for record in &drained {
        let value = record.attributes.values().next().unwrap();
        assert_eq!(value, &json!(4));
    }
}

#[test]
fn test_drain_empties_buffer() {
    let mut aggregator = Aggregator::new();
    aggregator.accept(ChangeRecord::new(key("health"), attrs(&[("current_health", json!(1))])));

    assert_eq!(aggregator.drain().len(), 1);
    assert!(aggregator.is_empty());
    assert!(aggregator.drain().is_empty());
}

#[test]
fn test_change_record_serializes_flat() {
    let record = ChangeRecord::new(
        key("farming_contract"),
        attrs(&[("status", json!("ready")), ("crop_type", json!("Snapdragon"))]),
    );

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({
            "entity_id": "sensor.runelite_zezima_farming_contract",
            "status": "ready",
            "crop_type": "Snapdragon"
        })
    );
}
