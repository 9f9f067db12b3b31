use super::{Outbox, TickContext, Tracker};
use crate::config::{BridgeConfig, FarmingConfig};
use crate::entity::{EntityKey, PlayerId};
use crate::state::{Attributes, Snapshot};
use crate::world::{FarmingContract, PatchType, World};
use chrono::{DateTime, SecondsFormat};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

/// Completion time not evaluated yet
pub const NOT_EVALUATED: i64 = -2;

/// Completion time of a slot nothing was ever planted in
pub const NEVER_PLANTED: i64 = -1;

/// Completion time of a slot occupied by a different crop
pub const OCCUPIED: i64 = i64::MAX;

/// Slot categories with a completion estimate. Grape, anima, special,
/// belladonna, calquat, celastrus, crystal and hops are never tracked.
pub const TRACKED_SLOTS: [PatchType; 13] = [
    PatchType::Allotment,
    PatchType::Flower,
    PatchType::Herb,
    PatchType::Tree,
    PatchType::FruitTree,
    PatchType::Bush,
    PatchType::Hardwood,
    PatchType::Redwood,
    PatchType::Seaweed,
    PatchType::Cactus,
    PatchType::Mushroom,
    PatchType::Hespori,
    PatchType::BigCompost,
];

/// Status derived from a completion time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStatus {
    /// Growing; completes at the contained epoch second
    InProgress(i64),
    NeverPlanted,
    /// Slot holds a different crop, no ETA
    Other,
    Ready,
}

impl GrowthStatus {
    /// Total mapping: MAX -> other, > 0 -> in progress, -1 -> never
    /// planted, anything else -> ready
    pub fn from_completion(completion: i64) -> Self {
        if completion == OCCUPIED {
            GrowthStatus::Other
        } else if completion > 0 {
            GrowthStatus::InProgress(completion)
        } else if completion == NEVER_PLANTED {
            GrowthStatus::NeverPlanted
        } else {
            GrowthStatus::Ready
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GrowthStatus::InProgress(_) => "in_progress",
            GrowthStatus::NeverPlanted => "never_planted",
            GrowthStatus::Other => "other",
            GrowthStatus::Ready => "ready",
        }
    }

    /// `status` plus `completion_time` while in progress
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("status".to_string(), json!(self.name()));
        if let GrowthStatus::InProgress(completion) = self {
            if let Some(formatted) = format_completion(*completion) {
                attributes.insert("completion_time".to_string(), json!(formatted));
            }
        }
        attributes
    }
}

/// Epoch seconds as an RFC 3339 UTC timestamp, e.g. "2023-11-14T22:13:20Z"
pub fn format_completion(epoch_seconds: i64) -> Option<String> {
    DateTime::from_timestamp(epoch_seconds, 0)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Entity suffix of a slot category
pub fn slot_suffix(patch: PatchType) -> String {
    match patch {
        PatchType::BigCompost => "compost_bin".to_string(),
        other => format!("{}_patch", other.name()),
    }
}

/// Last evaluated completion times plus the tick-offset calibration
#[derive(Debug, Clone)]
pub struct GrowthEstimator {
    completions: BTreeMap<PatchType, i64>,
    contract: Option<FarmingContract>,
    contract_completion: i64,
    tick_offset: i32,
    offset_changed: bool,
}

impl Default for GrowthEstimator {
    fn default() -> Self {
        Self {
            completions: TRACKED_SLOTS
                .iter()
                .map(|&slot| (slot, NOT_EVALUATED))
                .collect(),
            contract: None,
            contract_completion: NOT_EVALUATED,
            tick_offset: 0,
            offset_changed: false,
        }
    }
}

impl GrowthEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read every enabled slot, the contract and the calibration
    pub fn recompute(&mut self, world: &dyn World, config: &FarmingConfig) {
        for slot in TRACKED_SLOTS {
            if config.patch_enabled(slot) {
                let completion = world.patch_completion(slot, config.ignore_farming_guild);
                self.completions.insert(slot, completion);
            }
        }

        if config.contract {
            self.contract = world.farming_contract();
            self.contract_completion = self
                .contract
                .as_ref()
                .map_or(NOT_EVALUATED, |contract| contract.completion_time);
        }

        if config.tick_offset {
            // Stored negated by the client
            let offset = -world.raw_farming_tick_offset();
            if offset != self.tick_offset {
                debug!(offset, "Farming tick offset changed");
                self.tick_offset = offset;
                self.offset_changed = true;
            }
        }
    }

    pub fn completion(&self, slot: PatchType) -> i64 {
        self.completions.get(&slot).copied().unwrap_or(NOT_EVALUATED)
    }

    pub fn tick_offset(&self) -> i32 {
        self.tick_offset
    }

    fn render(&self, player: &PlayerId, config: &FarmingConfig) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for (&slot, &completion) in &self.completions {
            if completion == NOT_EVALUATED || !config.patch_enabled(slot) {
                continue;
            }
            snapshot.insert(
                EntityKey::new(player, &slot_suffix(slot)),
                GrowthStatus::from_completion(completion).attributes(),
            );
        }

        if config.contract && self.contract_completion != NOT_EVALUATED {
            if let Some(contract) = &self.contract {
                let mut attributes = GrowthStatus::from_completion(self.contract_completion).attributes();
                attributes.insert("patch_type".to_string(), json!(contract.patch.name()));
                attributes.insert("crop_type".to_string(), json!(contract.crop));
                snapshot.insert(EntityKey::new(player, "farming_contract"), attributes);
            }
        }

        // Published once it first moves away from the default
        if config.tick_offset && self.offset_changed {
            let mut attributes = Attributes::new();
            attributes.insert("farming_tick_offset".to_string(), json!(self.tick_offset));
            snapshot.insert(EntityKey::new(player, "farming_tick_offset"), attributes);
        }

        snapshot
    }
}

/// Growth slots, the farming contract and the tick-offset calibration
pub struct FarmingTracker {
    config: FarmingConfig,
    estimator: GrowthEstimator,
    recompute_due: bool,
    ticks_since_recompute: u32,
}

impl FarmingTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            config: config.farming.clone(),
            estimator: GrowthEstimator::new(),
            recompute_due: true,
            ticks_since_recompute: 0,
        }
    }

    fn enabled(&self) -> bool {
        self.config.patches || self.config.contract || self.config.tick_offset
    }

    pub fn estimator(&self) -> &GrowthEstimator {
        &self.estimator
    }
}

impl Tracker for FarmingTracker {
    fn name(&self) -> &'static str {
        "farming"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, _out: &mut Outbox) {
        if !self.enabled() {
            return;
        }

        self.ticks_since_recompute = self.ticks_since_recompute.saturating_add(1);
        let poll = self.config.poll_interval_ticks;
        if poll > 0 && self.ticks_since_recompute >= poll {
            self.recompute_due = true;
        }

        if self.recompute_due {
            self.estimator.recompute(ctx.world, &self.config);
            self.recompute_due = false;
            self.ticks_since_recompute = 0;
        }
    }

    fn snapshot(&self, player: &PlayerId) -> Snapshot {
        self.estimator.render(player, &self.config)
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        if key.starts_with("farming.") && key != "farming.birdhouses" {
            self.config = config.farming.clone();
            self.recompute_due = true;
        }
    }

    fn on_login_state_changed(&mut self, logged_in: bool) {
        if logged_in {
            self.recompute_due = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{WorldFrame, WorldPoint};

    fn player() -> PlayerId {
        PlayerId::from_display_name("Lord Farmer").unwrap()
    }

    fn tick(tracker: &mut FarmingTracker, world: &WorldFrame) -> Snapshot {
        let player = player();
        let ctx = TickContext {
            world,
            player: &player,
            tick: 0,
        };
        tracker.on_tick(&ctx, &mut Outbox::new());
        tracker.snapshot(&player)
    }

    fn key(suffix: &str) -> EntityKey {
        EntityKey::new(&player(), suffix)
    }

    #[test]
    fn test_status_mapping_is_total() {
        assert_eq!(GrowthStatus::from_completion(1_700_000_000), GrowthStatus::InProgress(1_700_000_000));
        assert_eq!(GrowthStatus::from_completion(-1), GrowthStatus::NeverPlanted);
        assert_eq!(GrowthStatus::from_completion(i64::MAX), GrowthStatus::Other);
        assert_eq!(GrowthStatus::from_completion(0), GrowthStatus::Ready);
        assert_eq!(GrowthStatus::from_completion(-7), GrowthStatus::Ready);
        assert_eq!(GrowthStatus::from_completion(i64::MIN), GrowthStatus::Ready);
    }

    #[test]
    fn test_in_progress_attributes_include_timestamp() {
        let attributes = GrowthStatus::InProgress(1_700_000_000).attributes();
        assert_eq!(attributes["status"], json!("in_progress"));
        assert_eq!(attributes["completion_time"], json!("2023-11-14T22:13:20Z"));

        let ready = GrowthStatus::Ready.attributes();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready["status"], json!("ready"));
    }

    #[test]
    fn test_slot_suffix() {
        assert_eq!(slot_suffix(PatchType::Herb), "herb_patch");
        assert_eq!(slot_suffix(PatchType::FruitTree), "fruit_tree_patch");
        assert_eq!(slot_suffix(PatchType::BigCompost), "compost_bin");
    }

    #[test]
    fn test_first_tick_evaluates_enabled_slots() {
        let mut world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));
        world.patches.insert(PatchType::Herb, 1_700_000_000);
        world.patches.insert(PatchType::Tree, 0);
        world.patches.insert(PatchType::Grape, 1_700_000_000);

        let mut tracker = FarmingTracker::new(&BridgeConfig::default());
        let snapshot = tick(&mut tracker, &world);

        assert_eq!(snapshot[&key("herb_patch")]["status"], json!("in_progress"));
        assert_eq!(snapshot[&key("tree_patch")]["status"], json!("ready"));
        assert_eq!(snapshot[&key("allotment_patch")]["status"], json!("never_planted"));
        assert!(!snapshot.contains_key(&key("grape_patch")));
        assert_eq!(snapshot.len(), TRACKED_SLOTS.len());
    }

    #[test]
    fn test_disabled_slot_not_evaluated() {
        let mut config = BridgeConfig::default();
        config.farming.herb = false;
        let world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));

        let mut tracker = FarmingTracker::new(&config);
        let snapshot = tick(&mut tracker, &world);
        assert!(!snapshot.contains_key(&key("herb_patch")));
        assert_eq!(tracker.estimator().completion(PatchType::Herb), NOT_EVALUATED);
    }

    #[test]
    fn test_recompute_only_on_checkpoints() {
        let mut config = BridgeConfig::default();
        config.farming.poll_interval_ticks = 10;
        let mut world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));
        world.patches.insert(PatchType::Herb, 1_700_000_000);

        let mut tracker = FarmingTracker::new(&config);
        tick(&mut tracker, &world);

        world.patches.insert(PatchType::Herb, 0);
        for _ in 0..9 {
            let snapshot = tick(&mut tracker, &world);
            assert_eq!(snapshot[&key("herb_patch")]["status"], json!("in_progress"));
        }
        let snapshot = tick(&mut tracker, &world);
        assert_eq!(snapshot[&key("herb_patch")]["status"], json!("ready"));
    }

    #[test]
    fn test_login_and_config_change_trigger_recompute() {
        let mut config = BridgeConfig::default();
        config.farming.ignore_farming_guild = true;
        let mut world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));
        let mut tracker = FarmingTracker::new(&config);
        tick(&mut tracker, &world);

        world.patches.insert(PatchType::Bush, 1_700_000_000);
        tracker.on_login_state_changed(true);
        let snapshot = tick(&mut tracker, &world);
        assert_eq!(snapshot[&key("bush_patch")]["status"], json!("in_progress"));

        world.patches.insert(PatchType::Bush, 1_700_000_000);
        world.guild_patches.insert(PatchType::Bush, OCCUPIED);
        config.farming.ignore_farming_guild = false;
        tracker.on_config_changed("farming.ignore_farming_guild", &config);
        let snapshot = tick(&mut tracker, &world);
        assert_eq!(snapshot[&key("bush_patch")]["status"], json!("other"));
    }

    #[test]
    fn test_contract_entity() {
        let mut world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));
        world.contract = Some(FarmingContract {
            crop: "Snapdragon".to_string(),
            patch: PatchType::Herb,
            completion_time: 1_700_000_000,
        });

        let mut tracker = FarmingTracker::new(&BridgeConfig::default());
        let snapshot = tick(&mut tracker, &world);
        let contract = &snapshot[&key("farming_contract")];
        assert_eq!(contract["status"], json!("in_progress"));
        assert_eq!(contract["patch_type"], json!("herb"));
        assert_eq!(contract["crop_type"], json!("Snapdragon"));
        assert_eq!(contract["completion_time"], json!("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_tick_offset_published_after_first_change() {
        let mut config = BridgeConfig::default();
        config.farming.poll_interval_ticks = 1;
        let mut world = WorldFrame::logged_in("Lord Farmer", WorldPoint::new(0, 0));

        let mut tracker = FarmingTracker::new(&config);
        let snapshot = tick(&mut tracker, &world);
        assert!(!snapshot.contains_key(&key("farming_tick_offset")));

        world.farming_tick_offset = 3;
        let snapshot = tick(&mut tracker, &world);
        assert_eq!(
            snapshot[&key("farming_tick_offset")]["farming_tick_offset"],
            json!(-3)
        );

        // Back to zero is still a change worth reporting
        world.farming_tick_offset = 0;
        let snapshot = tick(&mut tracker, &world);
        assert_eq!(
            snapshot[&key("farming_tick_offset")]["farming_tick_offset"],
            json!(0)
        );
    }
}
