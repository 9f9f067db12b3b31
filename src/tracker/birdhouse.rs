use super::growth::{GrowthStatus, NOT_EVALUATED};
use super::{Outbox, TickContext, Tracker};
use crate::config::BridgeConfig;
use crate::entity::{EntityKey, PlayerId};
use crate::state::Snapshot;

/// Birdhouse run completion, `<player>_birdhouses`
pub struct BirdhouseTracker {
    enabled: bool,
    poll_interval: u32,
    completion: i64,
    recompute_due: bool,
    ticks_since_recompute: u32,
}

impl BirdhouseTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            enabled: config.farming.birdhouses,
            poll_interval: config.farming.poll_interval_ticks,
            completion: NOT_EVALUATED,
            recompute_due: true,
            ticks_since_recompute: 0,
        }
    }
}

impl Tracker for BirdhouseTracker {
    fn name(&self) -> &'static str {
        "birdhouse"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, _out: &mut Outbox) {
        if !self.enabled {
            return;
        }

        self.ticks_since_recompute = self.ticks_since_recompute.saturating_add(1);
        if self.poll_interval > 0 && self.ticks_since_recompute >= self.poll_interval {
            self.recompute_due = true;
        }

        if self.recompute_due {
            self.completion = ctx.world.birdhouse_completion();
            self.recompute_due = false;
            self.ticks_since_recompute = 0;
        }
    }

    fn snapshot(&self, player: &PlayerId) -> Snapshot {
        let mut snapshot = Snapshot::new();
        if self.enabled && self.completion != NOT_EVALUATED {
            snapshot.insert(
                EntityKey::new(player, "birdhouses"),
                GrowthStatus::from_completion(self.completion).attributes(),
            );
        }
        snapshot
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        match key {
            "farming.birdhouses" => {
                self.enabled = config.farming.birdhouses;
                self.recompute_due = true;
            }
            "farming.poll_interval_ticks" => self.poll_interval = config.farming.poll_interval_ticks,
            _ => {}
        }
    }

    fn on_login_state_changed(&mut self, logged_in: bool) {
        if logged_in {
            self.recompute_due = true;
        }
    }
}
