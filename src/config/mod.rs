pub mod runtime;
pub use runtime::{new_connection_settings, ConnectionSettings, SharedConnectionSettings};

use crate::world::PatchType;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[cfg(test)]
mod tests;

/// Complete bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub aggression: AggressionConfig,
    #[serde(default)]
    pub farming: FarmingConfig,
    #[serde(default)]
    pub dailies: DailiesConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Hub connection settings (may be overridden from the environment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hub base URL, e.g. "http://homeassistant.local:8123"
    #[serde(default)]
    pub base_url: String,
    /// Long-lived bearer token
    #[serde(default)]
    pub token: String,
    /// Run the validation probe once at startup
    #[serde(default = "default_true")]
    pub validate_on_start: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            validate_on_start: default_true(),
        }
    }
}

/// How aggression progress updates reach the hub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressDelivery {
    /// Merged into the global update window
    #[default]
    Throttled,
    /// Flushed as a batch of their own on the tick they are produced
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ticks between batch flushes (0 = every tick)
    #[serde(default = "default_update_throttle")]
    pub update_throttle_ticks: u32,
    #[serde(default)]
    pub progress_delivery: ProgressDelivery,
}

fn default_update_throttle() -> u32 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            update_throttle_ticks: default_update_throttle(),
            progress_delivery: ProgressDelivery::default(),
        }
    }
}

/// Vitals attribute groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_true")]
    pub health: bool,
    #[serde(default = "default_true")]
    pub prayer: bool,
    #[serde(default = "default_true")]
    pub special_attack: bool,
    #[serde(default = "default_true")]
    pub run_energy: bool,
    #[serde(default = "default_true")]
    pub status_effects: bool,
    #[serde(default)]
    pub skill_boosts: bool,
    #[serde(default = "default_true")]
    pub online_status: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: true,
            prayer: true,
            special_attack: true,
            run_energy: true,
            status_effects: true,
            skill_boosts: false,
            online_status: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggressionConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum ticks between two "active" progress updates
    #[serde(default = "default_aggression_delay")]
    pub delay_ticks: u32,
}

fn default_aggression_delay() -> u32 {
    50
}

impl Default for AggressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ticks: default_aggression_delay(),
        }
    }
}

/// Growth slot tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmingConfig {
    /// Master toggle for every patch entity
    #[serde(default = "default_true")]
    pub patches: bool,
    #[serde(default = "default_true")]
    pub contract: bool,
    #[serde(default = "default_true")]
    pub tick_offset: bool,
    #[serde(default = "default_true")]
    pub birdhouses: bool,
    /// Leave patches inside the farming guild out of completion estimates
    #[serde(default)]
    pub ignore_farming_guild: bool,
    /// Periodic recomputation interval
    #[serde(default = "default_farming_poll")]
    pub poll_interval_ticks: u32,

    #[serde(default = "default_true")]
    pub allotment: bool,
    #[serde(default = "default_true")]
    pub flower: bool,
    #[serde(default = "default_true")]
    pub herb: bool,
    #[serde(default = "default_true")]
    pub tree: bool,
    #[serde(default = "default_true")]
    pub fruit_tree: bool,
    #[serde(default = "default_true")]
    pub bush: bool,
    #[serde(default = "default_true")]
    pub hardwood: bool,
    #[serde(default = "default_true")]
    pub redwood: bool,
    #[serde(default = "default_true")]
    pub seaweed: bool,
    #[serde(default = "default_true")]
    pub cactus: bool,
    #[serde(default = "default_true")]
    pub mushroom: bool,
    #[serde(default = "default_true")]
    pub hespori: bool,
    #[serde(default = "default_true")]
    pub compost_bin: bool,
}

fn default_farming_poll() -> u32 {
    100
}

impl Default for FarmingConfig {
    fn default() -> Self {
        Self {
            patches: true,
            contract: true,
            tick_offset: true,
            birdhouses: true,
            ignore_farming_guild: false,
            poll_interval_ticks: default_farming_poll(),
            allotment: true,
            flower: true,
            herb: true,
            tree: true,
            fruit_tree: true,
            bush: true,
            hardwood: true,
            redwood: true,
            seaweed: true,
            cactus: true,
            mushroom: true,
            hespori: true,
            compost_bin: true,
        }
    }
}

impl FarmingConfig {
    /// Whether a slot category is tracked at all.
    ///
    /// Categories without a toggle are never tracked.
    pub fn patch_enabled(&self, patch: PatchType) -> bool {
        if !self.patches {
            return false;
        }
        match patch {
            PatchType::Allotment => self.allotment,
            PatchType::Flower => self.flower,
            PatchType::Herb => self.herb,
            PatchType::Tree => self.tree,
            PatchType::FruitTree => self.fruit_tree,
            PatchType::Bush => self.bush,
            PatchType::Hardwood => self.hardwood,
            PatchType::Redwood => self.redwood,
            PatchType::Seaweed => self.seaweed,
            PatchType::Cactus => self.cactus,
            PatchType::Mushroom => self.mushroom,
            PatchType::Hespori => self.hespori,
            PatchType::BigCompost => self.compost_bin,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailiesConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// One-shot hub events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub idle: bool,
    #[serde(default = "default_idle_delay")]
    pub idle_tick_delay: u32,
    #[serde(default)]
    pub collection_log: bool,
    #[serde(default)]
    pub achievement_diary: bool,
    #[serde(default)]
    pub combat_task: bool,

    // Flipping one of these on queues a sample event
    #[serde(default)]
    pub test_collection_log: bool,
    #[serde(default)]
    pub test_achievement_diary: bool,
    #[serde(default)]
    pub test_combat_task: bool,

    /// Comma-separated state cell ids to watch, e.g. "1777, 4479"
    #[serde(default)]
    pub varbit_ids: String,
}

fn default_idle_delay() -> u32 {
    10
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            idle: false,
            idle_tick_delay: default_idle_delay(),
            collection_log: false,
            achievement_diary: false,
            combat_task: false,
            test_collection_log: false,
            test_achievement_diary: false,
            test_combat_task: false,
            varbit_ids: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Configuration input that could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Entry in a comma-separated id list that is not a non-negative integer
    InvalidId(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidId(raw) => write!(f, "Invalid state cell id: '{}'", raw),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a comma-separated id list.
///
/// Blank entries are skipped; anything else that is not a number comes back
/// as an error so the caller can log it and keep the valid ids.
///
/// # Examples
///
/// ```
/// use tickbridge::config::parse_id_list;
///
/// let ids = parse_id_list("1777, 4479,,abc");
/// assert_eq!(ids[0], Ok(1777));
/// assert_eq!(ids[1], Ok(4479));
/// assert!(ids[2].is_err());
/// ```
pub fn parse_id_list(raw: &str) -> Vec<Result<u32, ConfigError>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidId(entry.to_string()))
        })
        .collect()
}

/// Dotted keys whose value differs between two configurations.
///
/// Keys are "section.field" (e.g. "aggression.enabled"), sorted.
pub fn changed_keys(old: &BridgeConfig, new: &BridgeConfig) -> Vec<String> {
    let old = flatten(old);
    let new = flatten(new);

    let mut keys: Vec<String> = old
        .keys()
        .chain(new.keys())
        .filter(|key| old.get(*key) != new.get(*key))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

fn flatten(config: &BridgeConfig) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    // Plain data structs always serialize
    if let Ok(value) = serde_json::to_value(config) {
        flatten_into(&mut out, String::new(), value);
    }
    out
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                let key = if prefix.is_empty() {
                    name
                } else {
                    format!("{}.{}", prefix, name)
                };
                flatten_into(out, key, child);
            }
        }
        leaf => {
            out.insert(prefix, leaf);
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: BridgeConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}
