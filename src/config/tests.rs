use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = BridgeConfig::default();
    assert_eq!(config.pipeline.update_throttle_ticks, 5);
    assert_eq!(config.pipeline.progress_delivery, ProgressDelivery::Throttled);
    assert_eq!(config.aggression.delay_ticks, 50);
    assert!(!config.aggression.enabled);
    assert_eq!(config.events.idle_tick_delay, 10);
    assert_eq!(config.farming.poll_interval_ticks, 100);
    assert!(config.connection.validate_on_start);
    assert!(config.connection.base_url.is_empty());
}

#[test]
fn test_config_deserialization() {
    let toml = r#"
        [connection]
        base_url = "http://hub.local:8123"
        token = "abc"
        validate_on_start = false

        [pipeline]
        update_throttle_ticks = 0
        progress_delivery = "immediate"

        [aggression]
        enabled = true
        delay_ticks = 25

        [farming]
        herb = false
        ignore_farming_guild = true

        [events]
        idle = true
        varbit_ids = "1777,4479"
    "#;

    let config: BridgeConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.connection.base_url, "http://hub.local:8123");
    assert!(!config.connection.validate_on_start);
    assert_eq!(config.pipeline.update_throttle_ticks, 0);
    assert_eq!(config.pipeline.progress_delivery, ProgressDelivery::Immediate);
    assert!(config.aggression.enabled);
    assert_eq!(config.aggression.delay_ticks, 25);
    assert!(!config.farming.herb);
    assert!(config.farming.ignore_farming_guild);
    assert!(config.events.idle);
    assert_eq!(config.events.varbit_ids, "1777,4479");
}

#[test]
fn test_partial_config() {
    // Missing sections use defaults
    let toml = r#"
        [dailies]
        enabled = true
    "#;

    let config: BridgeConfig = toml::from_str(toml).unwrap();
    assert!(config.dailies.enabled);
    assert_eq!(config.pipeline.update_throttle_ticks, 5); // Default
    assert!(config.player.health); // Default
}

#[test]
fn test_patch_enabled_respects_master_toggle() {
    let mut farming = FarmingConfig::default();
    assert!(farming.patch_enabled(PatchType::Herb));
    assert!(farming.patch_enabled(PatchType::BigCompost));
    assert!(!farming.patch_enabled(PatchType::Grape));
    assert!(!farming.patch_enabled(PatchType::Hops));

    farming.herb = false;
    assert!(!farming.patch_enabled(PatchType::Herb));

    farming.patches = false;
    assert!(!farming.patch_enabled(PatchType::Tree));
}

#[test]
fn test_parse_id_list() {
    let ids = parse_id_list(" 1777 ,4479,, -3, x ");
    assert_eq!(
        ids,
        vec![
            Ok(1777),
            Ok(4479),
            Err(ConfigError::InvalidId("-3".to_string())),
            Err(ConfigError::InvalidId("x".to_string())),
        ]
    );
    assert!(parse_id_list("").is_empty());
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidId("abc".to_string());
    assert_eq!(err.to_string(), "Invalid state cell id: 'abc'");
}

#[test]
fn test_changed_keys_reports_dotted_paths() {
    let old = BridgeConfig::default();
    let mut new = old.clone();
    new.aggression.enabled = true;
    new.pipeline.progress_delivery = ProgressDelivery::Immediate;
    new.events.varbit_ids = "1777".to_string();

    assert_eq!(
        changed_keys(&old, &new),
        vec![
            "aggression.enabled".to_string(),
            "events.varbit_ids".to_string(),
            "pipeline.progress_delivery".to_string(),
        ]
    );
}

#[test]
fn test_changed_keys_empty_for_identical_configs() {
    let config = BridgeConfig::default();
    assert!(changed_keys(&config, &config.clone()).is_empty());
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[pipeline]\nupdate_throttle_ticks = 3").unwrap();

    let config = load_config(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.pipeline.update_throttle_ticks, 3);
}

#[test]
fn test_load_config_missing_file() {
    let err = load_config("/nonexistent/tickbridge.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_connection_settings_from_config() {
    let config = ConnectionConfig {
        base_url: " http://hub.local:8123/ ".to_string(),
        token: "tok".to_string(),
        validate_on_start: true,
    };
    let settings = ConnectionSettings::from_config(&config);
    assert_eq!(settings.base_url, "http://hub.local:8123");
    assert!(settings.is_configured());

    let empty = ConnectionSettings::from_config(&ConnectionConfig::default());
    assert!(!empty.is_configured());
}
