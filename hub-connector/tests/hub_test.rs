use hub_connector::replay::{self, ReplayStep};
use hub_connector::HubClient;
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tickbridge::config::{load_config, new_connection_settings, ConnectionSettings};
use tickbridge::world::{GameState, PlayerActivity, Skill};
use tickbridge::{BridgeConfig, LifecycleSignal, Pipeline, WorldFrame};
use tokio::runtime::Handle;

fn health_only_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.pipeline.update_throttle_ticks = 1;
    config.player.prayer = false;
    config.player.special_attack = false;
    config.player.run_energy = false;
    config.player.status_effects = false;
    config.player.skill_boosts = false;
    config.player.online_status = false;
    config.farming.patches = false;
    config.farming.contract = false;
    config.farming.tick_offset = false;
    config.farming.birdhouses = false;
    config.dailies.enabled = false;
    config.events.idle = false;
    config
}

fn zezima(health: i32) -> WorldFrame {
    let mut frame = WorldFrame {
        player_name: Some("Zezima".to_string()),
        game_state: GameState::LoggedIn,
        world: 301,
        ..WorldFrame::default()
    };
    frame.boosted_levels.insert(Skill::Hitpoints, health);
    frame
}

/// Sends are fire-and-forget, so wait for the mock to see them
async fn wait_for(mock: &mockito::Mock) {
    for _ in 0..50 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pipeline_posts_entity_batch_to_hub() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/services/runelite/set_multi_entity_data")
        .match_header("authorization", "Bearer token-123")
        .match_body(Matcher::Json(json!({
            "entities": [
                {"entity_id": "sensor.runelite_zezima_health", "current_health": 64}
            ]
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let settings = new_connection_settings(ConnectionSettings {
        base_url: server.url(),
        token: "token-123".to_string(),
    });
    let client = HubClient::new(settings, Handle::current());
    let mut pipeline = Pipeline::new(health_only_config(), Arc::new(client));

    let frame = zezima(64);
    pipeline.on_signal(&frame, &LifecycleSignal::GameStateChanged { state: GameState::LoggedIn });
    pipeline.on_tick(&frame);
    // Unchanged value: nothing more is sent
    pipeline.on_tick(&frame);

    wait_for(&mock).await;
    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_event_posted_to_service_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/services/runelite/trigger_idle_notify")
        .match_header("authorization", "Bearer token-123")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let _batches = server
        .mock("POST", "/api/services/runelite/set_multi_entity_data")
        .with_status(200)
        .create_async()
        .await;

    let mut config = health_only_config();
    config.events.idle = true;
    config.events.idle_tick_delay = 3;

    let settings = new_connection_settings(ConnectionSettings {
        base_url: server.url(),
        token: "token-123".to_string(),
    });
    let client = HubClient::new(settings, Handle::current());
    let mut pipeline = Pipeline::new(config, Arc::new(client));

    let idle = PlayerActivity {
        animation: -1,
        pose: 808,
        idle_pose: 808,
        interacting: false,
    };
    let mut frame = zezima(99);
    // Chopping first, then standing still
    frame.activity = Some(PlayerActivity { animation: 879, ..idle });
    pipeline.on_tick(&frame);
    frame.activity = Some(idle);
    for _ in 0..10 {
        pipeline.on_tick(&frame);
    }

    wait_for(&mock).await;
    mock.assert_async().await;
}

#[test]
fn test_dry_run_from_files() {
    let mut config_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        r#"
[pipeline]
update_throttle_ticks = 2

[player]
prayer = false
special_attack = false
run_energy = false
status_effects = false
online_status = false

[farming]
patches = false
contract = false
tick_offset = false
birdhouses = false

[dailies]
enabled = false

[events]
idle = false
"#
    )
    .unwrap();

    let mut script_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        script_file,
        r#"# log in and sit still
{{"step":"tick","frame":{{"player_name":"Zezima","game_state":"logged_in","boosted_levels":{{"hitpoints":50}}}},"repeat":2}}
{{"step":"tick","frame":{{"player_name":"Zezima","game_state":"logged_in","boosted_levels":{{"hitpoints":45}}}},"repeat":2}}
{{"step":"config","patch":{{"player":{{"health":false}}}}}}
{{"step":"tick","repeat":4}}"#
    )
    .unwrap();

    let config = load_config(config_file.path().to_str().unwrap()).unwrap();
    let steps = replay::load_script(script_file.path().to_str().unwrap()).unwrap();
    assert_eq!(steps.len(), 4);
    assert!(matches!(steps[3], ReplayStep::Tick { frame: None, repeat: 4 }));

    let (summary, requests) = replay::dry_run(config, &steps).unwrap();

    assert_eq!(summary.ticks, 8);
    assert_eq!(summary.signals, 1);
    assert_eq!(summary.config_keys, vec!["player.health"]);

    let healths: Vec<_> = requests
        .iter()
        .flat_map(|(_, body)| body["entities"].as_array().cloned().unwrap_or_default())
        .filter(|entity| entity["entity_id"] == "sensor.runelite_zezima_health")
        .map(|entity| entity["current_health"].clone())
        .collect();
    assert_eq!(healths, vec![json!(50), json!(45)]);
}
