use anyhow::{Context, Result};
use serde_json::Value;
use tickbridge::config::{ConnectionSettings, SharedConnectionSettings};
use tickbridge::{Submission, Transport};
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

/// HTTP transport to the home hub.
///
/// Every send re-reads the shared connection settings, so an edited URL or
/// token applies from the next batch on. Sends are spawned onto the given
/// runtime and never awaited by the caller.
#[derive(Clone)]
pub struct HubClient {
    http_client: reqwest::Client,
    settings: SharedConnectionSettings,
    runtime: Handle,
}

impl HubClient {
    pub fn new(settings: SharedConnectionSettings, runtime: Handle) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            settings,
            runtime,
        }
    }

    /// Snapshot of the settings the next send will use
    pub fn settings(&self) -> ConnectionSettings {
        match self.settings.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }
}

impl Transport for HubClient {
    fn post(&self, path: &str, body: Value) -> Submission {
        let settings = self.settings();
        if !settings.is_configured() {
            warn!("URL or Access Token not configured");
            return Submission::NotConfigured;
        }

        let url = format!("{}/api{}", settings.base_url, path);
        let http_client = self.http_client.clone();
        let token = settings.token;

        let handle = self.runtime.spawn(async move {
            match post_json(&http_client, &url, &token, &body).await {
                Ok(()) => debug!(url = %url, "Hub accepted request"),
                Err(e) => error!(url = %url, error = %e, "Failed to send request to hub"),
            }
        });

        Submission::Pending(handle)
    }
}

/// POST a JSON body with the bearer header; any non-2xx status is an error.
async fn post_json(http_client: &reqwest::Client, url: &str, token: &str, body: &Value) -> Result<()> {
    let response = http_client
        .post(url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .json(body)
        .send()
        .await
        .context("Failed to send HTTP request to hub")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());

        anyhow::bail!("Hub returned error status {}: {}", status, body);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tickbridge::config::new_connection_settings;
    use tickbridge::dispatch::MULTI_ENTITY_PATH;

    fn client_for(base_url: &str, token: &str) -> HubClient {
        let settings = new_connection_settings(ConnectionSettings {
            base_url: base_url.to_string(),
            token: token.to_string(),
        });
        HubClient::new(settings, Handle::current())
    }

    #[tokio::test]
    async fn test_post_sends_bearer_and_json_body() {
        let mut server = Server::new_async().await;
        let body = json!({
            "entities": [
                {"entity_id": "sensor.runelite_zezima_health", "current_health": 42}
            ]
        });
        let mock = server
            .mock("POST", "/api/services/runelite/set_multi_entity_data")
            .match_header("authorization", "Bearer secret")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(body.clone()))
            .with_status(200)
            .create_async()
            .await;

        let client = client_for(&server.url(), "secret");
        match client.post(MULTI_ENTITY_PATH, body) {
            Submission::Pending(handle) => handle.await.unwrap(),
            other => panic!("Expected pending submission, got {:?}", other),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url(), "");
        let submission = client.post(MULTI_ENTITY_PATH, json!({"entities": []}));
        assert!(matches!(submission, Submission::NotConfigured));
        assert!(!submission.is_sent());

        mock.assert_async().await;
    }

    /// Log sink shared between the test and the subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_settings_warn_once_per_send() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let client = client_for("http://localhost:8123", "");
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                assert!(!client.post(MULTI_ENTITY_PATH, json!({"entities": []})).is_sent());
            }
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("URL or Access Token not configured").count(), 3);
        assert_eq!(output.matches("WARN").count(), 3);
    }

    #[tokio::test]
    async fn test_error_status_is_logged_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/runelite/trigger_idle_notify")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url(), "secret");
        if let Submission::Pending(handle) =
            client.post("/services/runelite/trigger_idle_notify", json!({}))
        {
            // The task swallows the failure; the join itself succeeds
            handle.await.unwrap();
        } else {
            panic!("Expected pending submission");
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_settings_edit_applies_to_next_send() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/services/runelite/set_multi_entity_data")
            .match_header("authorization", "Bearer rotated")
            .with_status(200)
            .create_async()
            .await;

        let settings = new_connection_settings(ConnectionSettings::default());
        let client = HubClient::new(settings.clone(), Handle::current());
        assert!(matches!(
            client.post(MULTI_ENTITY_PATH, json!({"entities": []})),
            Submission::NotConfigured
        ));

        *settings.write().unwrap() = ConnectionSettings {
            base_url: server.url(),
            token: "rotated".to_string(),
        };

        if let Submission::Pending(handle) = client.post(MULTI_ENTITY_PATH, json!({"entities": []})) {
            handle.await.unwrap();
        } else {
            panic!("Expected pending submission");
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_hub_does_not_panic() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let client = client_for("http://127.0.0.1:9", "secret");
        if let Submission::Pending(handle) = client.post(MULTI_ENTITY_PATH, json!({"entities": []})) {
            assert!(handle.await.is_ok());
        } else {
            panic!("Expected pending submission");
        }
    }
}
