use super::*;
use serde_json::json;

#[test]
fn test_builder_collects_payload() {
    let event = HubEvent::new(services::COMBAT_TASK)
        .with("task_name", "A Slow Death")
        .with("tier", "easy");

    assert_eq!(event.service, "trigger_combat_task_notify");
    assert_eq!(event.payload.get("task_name"), Some(&json!("A Slow Death")));
    assert_eq!(event.payload.get("tier"), Some(&json!("easy")));
    assert!(event.validate().is_ok());
}

#[test]
fn test_empty_payload_is_valid() {
    let event = HubEvent::new(services::IDLE);
    assert!(event.payload.is_empty());
    assert!(event.validate().is_ok());
}

#[test]
fn test_missing_service_fails() {
    let event = HubEvent::new("");
    assert_eq!(event.validate().unwrap_err(), HubEventError::MissingService);
}

#[test]
fn test_invalid_service_fails() {
    let event = HubEvent::new("set/../admin");
    assert!(matches!(
        event.validate(),
        Err(HubEventError::InvalidServiceName(_))
    ));
}

#[test]
fn test_all_known_services_are_valid() {
    for service in [
        services::IDLE,
        services::VARBIT_CHANGE,
        services::COLLECTION_LOG,
        services::ACHIEVEMENT_DIARY,
        services::COMBAT_TASK,
    ] {
        assert!(HubEvent::new(service).validate().is_ok(), "{}", service);
    }
}
