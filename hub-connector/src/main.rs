use anyhow::{Context, Result};
use hub_connector::replay::{self, ReplayStep, Replayer};
use hub_connector::{probe, HubClient};
use std::sync::Arc;
use std::time::Duration;
use tickbridge::config::{self, new_connection_settings, ConnectionSettings, SharedConnectionSettings};
use tickbridge::Pipeline;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Game tick cadence
const TICK_INTERVAL: Duration = Duration::from_millis(600);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub_connector=info,tickbridge=info".into()),
        )
        .init();

    info!("Hub connector starting...");

    let config_path =
        std::env::var("TICKBRIDGE_CONFIG").unwrap_or_else(|_| "tickbridge.toml".to_string());
    let script_path = std::env::var("TICKBRIDGE_SCRIPT")
        .context("TICKBRIDGE_SCRIPT is required (path to a JSON-lines replay script)")?;
    let dry_run = std::env::var("TICKBRIDGE_DRY_RUN")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let bridge_config = config::load_config(&config_path)?;
    let steps = replay::load_script(&script_path)?;

    info!(
        config = %config_path,
        script = %script_path,
        steps = steps.len(),
        dry_run,
        throttle_ticks = bridge_config.pipeline.update_throttle_ticks,
        "Configuration loaded"
    );

    if dry_run {
        let (summary, requests) = replay::dry_run(bridge_config, &steps)?;
        for (path, body) in &requests {
            println!("{} {}", path, body);
        }
        info!(
            ticks = summary.ticks,
            signals = summary.signals,
            requests = requests.len(),
            "Dry run finished"
        );
        return Ok(());
    }

    let settings = new_connection_settings(ConnectionSettings::from_env(&bridge_config.connection));
    let client = HubClient::new(Arc::clone(&settings), Handle::current());

    if bridge_config.connection.validate_on_start {
        let report = probe::validate_connection(client.http_client(), &client.settings()).await;
        if !report.credentials_valid {
            warn!("Hub connection check failed, updates will be dropped until it is fixed");
        }
    }

    let pipeline = Pipeline::new(bridge_config, Arc::new(client));
    info!(trackers = ?pipeline.tracker_names(), "Pipeline ready");
    let mut replayer = Replayer::new(pipeline);

    tokio::select! {
        result = run_paced(&mut replayer, &steps, &settings) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    let summary = replayer.summary();
    info!(
        ticks = summary.ticks,
        signals = summary.signals,
        config_changes = summary.config_keys.len(),
        "Hub connector stopped"
    );

    Ok(())
}

/// Replay the script at the real tick cadence
async fn run_paced(
    replayer: &mut Replayer,
    steps: &[ReplayStep],
    settings: &SharedConnectionSettings,
) -> Result<()> {
    let mut interval = tokio::time::interval(TICK_INTERVAL);

    for step in steps {
        match step {
            ReplayStep::Tick { frame, repeat } => {
                if let Some(frame) = frame {
                    replayer.set_frame(frame.clone());
                }
                for _ in 0..*repeat {
                    interval.tick().await;
                    replayer.tick();
                }
            }
            other => {
                let keys = replayer.apply(other)?;
                if keys.iter().any(|key| key.starts_with("connection.")) {
                    let updated =
                        ConnectionSettings::from_env(&replayer.pipeline().config().connection);
                    match settings.write() {
                        Ok(mut current) => *current = updated,
                        Err(poisoned) => *poisoned.into_inner() = updated,
                    }
                    info!("Connection settings updated");
                }
            }
        }
    }

    Ok(())
}
