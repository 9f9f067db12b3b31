// Connection validation probe
//
// Two GETs against the hub: the API root proves URL and token, the service
// listing tells whether the integration's service domain is installed.
// Results are human-readable lines for the operator, never pipeline input.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use tickbridge::config::ConnectionSettings;
use tracing::{error, info};

/// Service domain the hub-side integration registers
pub const SERVICE_DOMAIN: &str = "runelite";

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    domain: String,
}

/// Outcome of one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// URL and token were accepted by the API root
    pub credentials_valid: bool,
    /// None when the service listing could not be read
    pub domain_found: Option<bool>,
    /// Operator-facing lines, in the order they were produced
    pub messages: Vec<String>,
}

impl ProbeReport {
    fn say(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(message = %message, "Connection check");
        self.messages.push(message);
    }
}

/// Check URL and token, then look for the integration's service domain.
///
/// Never fails: every problem becomes a message in the report.
pub async fn validate_connection(
    http_client: &reqwest::Client,
    settings: &ConnectionSettings,
) -> ProbeReport {
    let mut report = ProbeReport::default();

    if !settings.is_configured() {
        report.say("URL or Access Token not configured");
        return report;
    }

    let api_url = format!("{}/api/", settings.base_url);
    info!(url = %api_url, "Testing hub connection");

    let response = match authorized_get(http_client, &api_url, &settings.token).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Error connecting to the hub API");
            report.say("Invalid Home Assistant token or URL.");
            return report;
        }
    };

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        report.say(format!(
            "Invalid Home Assistant token or URL. Code: {}, message: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        ));
        return report;
    }

    report.credentials_valid = true;
    report.say("Home Assistant token and URL are valid.");

    match list_service_domains(http_client, settings).await {
        Ok(domains) => {
            info!(domains = ?domains, "Available service domains");
            let found = domains.contains(SERVICE_DOMAIN);
            report.domain_found = Some(found);
            if found {
                report.say("Successfully found the runelite plugin");
            } else {
                report.say("Warning: 'runelite' service domain not found in Home Assistant");
                report.say(
                    "To make this work, please add the 'runelite' integration to Home Assistant.",
                );
            }
        }
        Err(e) => {
            error!(error = %e, "Error listing hub services");
            report.say("Could not list home assistant services");
        }
    }

    report
}

/// GET {base}/api/services and collect the distinct service domains
pub async fn list_service_domains(
    http_client: &reqwest::Client,
    settings: &ConnectionSettings,
) -> Result<BTreeSet<String>> {
    let url = format!("{}/api/services", settings.base_url);
    info!(url = %url, "Listing hub services");

    let response = authorized_get(http_client, &url, &settings.token).await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        anyhow::bail!(
            "Code: {}, message: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );
    }

    let services: Vec<ServiceEntry> = response
        .json()
        .await
        .context("Failed to parse hub services response")?;

    Ok(services.into_iter().map(|s| s.domain).collect())
}

async fn authorized_get(
    http_client: &reqwest::Client,
    url: &str,
    token: &str,
) -> Result<reqwest::Response> {
    http_client
        .get(url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))
}
