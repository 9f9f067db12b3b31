use super::{Outbox, SignalContext, TickContext, Tracker};
use crate::config::BridgeConfig;
use crate::entity::{EntityKey, PlayerId};
use crate::state::{Attributes, Snapshot};
use crate::world::{ids, ChatKind, Item, LifecycleSignal, World};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

const HERB_BOX_MAX: i32 = 15;
const HERB_BOX_COST: i32 = 9500;
const SAND_QUEST_COMPLETE: i32 = 160;

/// More noted staves than this in one inventory update means they were bought
const STAVES_PURCHASE_MIN: i32 = 15;

/// How long a staves purchase prompt stays armed
pub const STAVES_WATCH_TICKS: u64 = 200;

const SAND_DELIVERED: &str = "Bert delivers the sand to your bank.";
const STAVES_PROMPT: &str = "discounted battlestaves";

/// Claim state of a daily task
pub const UNAVAILABLE: i32 = -1;
pub const CLAIMABLE: i32 = 0;
pub const CLAIMED: i32 = 1;

/// Claimable-once-a-day rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DailyTask {
    HerbBoxes,
    Staves,
    Essence,
    Runes,
    Sand,
    Flax,
    Arrows,
    Dynamite,
}

impl DailyTask {
    pub const ALL: [DailyTask; 8] = [
        DailyTask::HerbBoxes,
        DailyTask::Staves,
        DailyTask::Essence,
        DailyTask::Runes,
        DailyTask::Sand,
        DailyTask::Flax,
        DailyTask::Arrows,
        DailyTask::Dynamite,
    ];

    pub fn id(self) -> &'static str {
        match self {
            DailyTask::HerbBoxes => "herb_boxes",
            DailyTask::Staves => "staves",
            DailyTask::Essence => "essence",
            DailyTask::Runes => "runes",
            DailyTask::Sand => "sand",
            DailyTask::Flax => "flax",
            DailyTask::Arrows => "arrows",
            DailyTask::Dynamite => "dynamite",
        }
    }

    /// Cell that flips once the reward has been claimed today
    pub fn claim_cell(self) -> u32 {
        match self {
            DailyTask::HerbBoxes => ids::VARBIT_DAILY_HERB_BOXES,
            DailyTask::Staves => ids::VARBIT_DAILY_STAVES,
            DailyTask::Essence => ids::VARBIT_DAILY_ESSENCE,
            DailyTask::Runes => ids::VARBIT_DAILY_RUNES,
            DailyTask::Sand => ids::VARBIT_DAILY_SAND,
            DailyTask::Flax => ids::VARBIT_DAILY_FLAX,
            DailyTask::Arrows => ids::VARBIT_DAILY_ARROWS,
            DailyTask::Dynamite => ids::VARBIT_DAILY_DYNAMITE,
        }
    }

    /// Current claim state from the world's state cells
    pub fn evaluate(self, world: &dyn World) -> i32 {
        let claimed = |task: DailyTask| {
            if world.varbit(task.claim_cell()) == 0 {
                CLAIMABLE
            } else {
                CLAIMED
            }
        };
        let diary_done = |cell: u32| world.varbit(cell) == 1;

        match self {
            DailyTask::HerbBoxes => {
                if world.varbit(ids::VARBIT_ACCOUNT_TYPE) != 0
                    || world.varp(ids::VARP_NMZ_REWARD_POINTS) < HERB_BOX_COST
                {
                    UNAVAILABLE
                } else if world.varbit(ids::VARBIT_DAILY_HERB_BOXES) < HERB_BOX_MAX {
                    CLAIMABLE
                } else {
                    CLAIMED
                }
            }
            DailyTask::Sand => {
                if world.varbit(ids::VARBIT_ACCOUNT_TYPE) == ids::ACCOUNT_TYPE_ULTIMATE
                    || world.varbit(ids::VARBIT_QUEST_HAND_IN_THE_SAND) < SAND_QUEST_COMPLETE
                {
                    UNAVAILABLE
                } else {
                    claimed(self)
                }
            }
            _ => {
                let diary = match self {
                    DailyTask::Staves => ids::VARBIT_DIARY_VARROCK_EASY,
                    DailyTask::Essence => ids::VARBIT_DIARY_ARDOUGNE_MEDIUM,
                    DailyTask::Runes => ids::VARBIT_DIARY_WILDERNESS_EASY,
                    DailyTask::Flax => ids::VARBIT_DIARY_KANDARIN_EASY,
                    DailyTask::Arrows => ids::VARBIT_DIARY_WESTERN_EASY,
                    _ => ids::VARBIT_DIARY_KOUREND_MEDIUM,
                };
                if diary_done(diary) {
                    claimed(self)
                } else {
                    UNAVAILABLE
                }
            }
        }
    }
}

/// Daily reward claim states, `<player>_daily_<task>`
pub struct DailyTracker {
    enabled: bool,
    statuses: BTreeMap<DailyTask, i32>,
    /// Claim cells as last sampled
    watched: BTreeMap<u32, i32>,
    evaluate_due: bool,
    /// Tick the staves purchase prompt was seen
    staves_watch: Option<u64>,
}

impl DailyTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            enabled: config.dailies.enabled,
            statuses: DailyTask::ALL.iter().map(|&task| (task, UNAVAILABLE)).collect(),
            watched: BTreeMap::new(),
            evaluate_due: true,
            staves_watch: None,
        }
    }

    pub fn status(&self, task: DailyTask) -> i32 {
        self.statuses.get(&task).copied().unwrap_or(UNAVAILABLE)
    }

    fn handle_inventory(&mut self, items: &[Item], tick: u64) {
        let Some(started) = self.staves_watch else {
            return;
        };

        if tick.saturating_sub(started) > STAVES_WATCH_TICKS {
            info!("Battlestaff watch window expired");
            self.staves_watch = None;
            return;
        }

        let purchased = items
            .iter()
            .any(|item| item.id == ids::ITEM_BATTLESTAFF_NOTED && item.quantity > STAVES_PURCHASE_MIN);
        if purchased {
            info!("Battlestaff purchase detected");
            self.statuses.insert(DailyTask::Staves, CLAIMED);
            self.staves_watch = None;
        }
    }
}

impl Tracker for DailyTracker {
    fn name(&self) -> &'static str {
        "daily"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, _out: &mut Outbox) {
        if !self.enabled {
            return;
        }

        let sampled: BTreeMap<u32, i32> = DailyTask::ALL
            .iter()
            .map(|task| (task.claim_cell(), ctx.world.varbit(task.claim_cell())))
            .collect();
        if sampled != self.watched {
            self.watched = sampled;
            self.evaluate_due = true;
        }

        if self.evaluate_due {
            for task in DailyTask::ALL {
                self.statuses.insert(task, task.evaluate(ctx.world));
            }
            self.evaluate_due = false;
            debug!(tick = ctx.tick, "Daily tasks re-evaluated");
        }
    }

    fn snapshot(&self, player: &PlayerId) -> Snapshot {
        let mut snapshot = Snapshot::new();
        if !self.enabled {
            return snapshot;
        }

        for (task, status) in &self.statuses {
            let mut attributes = Attributes::new();
            attributes.insert("state".to_string(), json!(status));
            snapshot.insert(
                EntityKey::new(player, &format!("daily_{}", task.id())),
                attributes,
            );
        }
        snapshot
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        if key == "dailies.enabled" {
            self.enabled = config.dailies.enabled;
            self.evaluate_due = true;
        }
    }

    fn on_signal(&mut self, signal: &LifecycleSignal, ctx: &SignalContext<'_>, _out: &mut Outbox) {
        if !self.enabled {
            return;
        }

        match signal {
            LifecycleSignal::ChatMessage { chat, text } => {
                if *chat == ChatKind::MesBox && text == SAND_DELIVERED {
                    self.statuses.insert(DailyTask::Sand, CLAIMED);
                }
                if super::chat::strip_tags(text).contains(STAVES_PROMPT) {
                    info!(tick = ctx.tick, "Battlestaff purchase prompt seen, watching inventory");
                    self.staves_watch = Some(ctx.tick);
                }
            }
            LifecycleSignal::ItemContainerChanged { container, items }
                if *container == ids::CONTAINER_INVENTORY =>
            {
                self.handle_inventory(items, ctx.tick);
            }
            _ => {}
        }
    }

    fn on_login_state_changed(&mut self, logged_in: bool) {
        if logged_in {
            self.evaluate_due = true;
        } else {
            self.staves_watch = None;
        }
    }
}
