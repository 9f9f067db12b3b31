use super::ConnectionConfig;
use std::sync::{Arc, RwLock};

/// Hub address and credentials read by the transport on every send.
///
/// Shared behind a lock so edits take effect on the next send without
/// rebuilding the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub token: String,
}

impl ConnectionSettings {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
        }
    }

    /// Build from config, letting HUB_BASE_URL / HUB_TOKEN override.
    pub fn from_env(config: &ConnectionConfig) -> Self {
        let mut settings = Self::from_config(config);

        if let Ok(v) = std::env::var("HUB_BASE_URL") {
            if !v.trim().is_empty() {
                settings.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("HUB_TOKEN") {
            if !v.trim().is_empty() {
                settings.token = v.trim().to_string();
            }
        }

        settings
    }

    /// Both the base URL and the token are present
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.token.is_empty()
    }
}

pub type SharedConnectionSettings = Arc<RwLock<ConnectionSettings>>;

pub fn new_connection_settings(settings: ConnectionSettings) -> SharedConnectionSettings {
    Arc::new(RwLock::new(settings))
}
