use super::HubEvent;
use std::fmt;

/// Validation errors for HubEvent
#[derive(Debug, Clone, PartialEq)]
pub enum HubEventError {
    MissingService,
    InvalidServiceName(String),
}

impl fmt::Display for HubEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubEventError::MissingService => write!(f, "service is required"),
            HubEventError::InvalidServiceName(s) => {
                write!(f, "invalid service name '{}': must be lowercase with optional underscores", s)
            }
        }
    }
}

impl std::error::Error for HubEventError {}

/// Validates a HubEvent.
///
/// Validation rules:
/// - Required fields: service
/// - Service format: lowercase letters, numbers, underscores
///   (e.g., "trigger_idle_notify")
pub fn validate(event: &HubEvent) -> Result<(), HubEventError> {
    if event.service.is_empty() {
        return Err(HubEventError::MissingService);
    }

    if !is_valid_service_name(&event.service) {
        return Err(HubEventError::InvalidServiceName(event.service.clone()));
    }

    Ok(())
}

/// Validates service name format.
///
/// Valid service names:
/// - Lowercase letters (a-z)
/// - Numbers (0-9)
/// - Underscores (_) as separators
/// - No leading/trailing underscores
fn is_valid_service_name(service: &str) -> bool {
    if service.is_empty() {
        return false;
    }

    if service.starts_with('_') || service.ends_with('_') {
        return false;
    }

    service
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
