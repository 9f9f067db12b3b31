use super::{Outbox, TickContext, Tracker};
use crate::config::{parse_id_list, BridgeConfig};
use crate::entity::PlayerId;
use crate::event::{services, HubEvent};
use crate::state::Snapshot;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Sends `trigger_varbit_change_notify` whenever a configured state cell
/// moves away from its previously seen value
pub struct VarbitTracker {
    /// Watched id -> last seen value (None until first sampled)
    watched: BTreeMap<u32, Option<i32>>,
}

impl VarbitTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        let mut tracker = Self {
            watched: BTreeMap::new(),
        };
        tracker.parse_watched(&config.events.varbit_ids);
        tracker
    }

    fn parse_watched(&mut self, raw: &str) {
        self.watched.clear();

        for parsed in parse_id_list(raw) {
            match parsed {
                Ok(id) => {
                    self.watched.insert(id, None);
                }
                Err(e) => warn!(error = %e, "Skipping watched state cell"),
            }
        }

        if !self.watched.is_empty() {
            let ids: Vec<u32> = self.watched.keys().copied().collect();
            info!(?ids, "Watching state cells");
        }
    }

    pub fn watched_ids(&self) -> Vec<u32> {
        self.watched.keys().copied().collect()
    }
}

impl Tracker for VarbitTracker {
    fn name(&self) -> &'static str {
        "varbit"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, out: &mut Outbox) {
        for (&id, previous) in self.watched.iter_mut() {
            let current = ctx.world.varbit(id);

            if let Some(old) = *previous {
                if old != current {
                    debug!(varbit_id = id, old, new = current, "State cell changed");
                    out.send(
                        HubEvent::new(services::VARBIT_CHANGE)
                            .with("varbit_id", id)
                            .with("new_value", current)
                            .with("old_value", old),
                    );
                }
            }

            *previous = Some(current);
        }
    }

    fn snapshot(&self, _player: &PlayerId) -> Snapshot {
        Snapshot::new()
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        if key == "events.varbit_ids" {
            self.parse_watched(&config.events.varbit_ids);
        }
    }
}
