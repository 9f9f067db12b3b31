use super::{Outbox, SignalContext, TickContext, Tracker};
use crate::config::{BridgeConfig, PlayerConfig};
use crate::entity::{EntityKey, PlayerId};
use crate::state::{Attributes, Snapshot};
use crate::world::{ids, GameState, LifecycleSignal, Skill, World};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Active ailment as mirrored to the hub
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusEffect {
    pub name: String,
    /// Damage per hit
    pub number: i32,
    pub time: String,
}

/// Decode the poison player variable.
///
/// 1..=100 is poison (damage ceil(v / 5)), 1_000_000 and up is venom
/// (damage min(20, (v - 999_997) * 2)); anything else means healthy.
pub fn status_effects(poison: i32) -> Vec<StatusEffect> {
    let (name, damage) = if (1..=100).contains(&poison) {
        ("Poison", (poison + 4) / 5)
    } else if poison >= 1_000_000 {
        let damage = ((poison as i64 - 999_997) * 2).min(20);
        ("Venom", damage as i32)
    } else {
        return Vec::new();
    };

    vec![StatusEffect {
        name: name.to_string(),
        number: damage,
        time: String::new(),
    }]
}

#[derive(Clone, Debug, PartialEq)]
struct Reading {
    health: i32,
    prayer: i32,
    special_attack: i32,
    run_energy: i32,
    status_effects: Vec<StatusEffect>,
    skills: BTreeMap<Skill, i32>,
}

impl Reading {
    fn sample(world: &dyn World) -> Self {
        Self {
            health: world.boosted_level(Skill::Hitpoints),
            prayer: world.boosted_level(Skill::Prayer),
            special_attack: world.varp(ids::VARP_SPECIAL_ATTACK) / 10,
            run_energy: world.run_energy() / 100,
            status_effects: status_effects(world.varp(ids::VARP_POISON)),
            skills: Skill::ALL
                .iter()
                .map(|&skill| (skill, world.boosted_level(skill)))
                .collect(),
        }
    }
}

/// Health, prayer, special attack, run energy, ailments, boosted skills and
/// online status
pub struct VitalsTracker {
    config: PlayerConfig,
    reading: Option<Reading>,
    online: bool,
    world: i32,
}

impl VitalsTracker {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            config: config.player.clone(),
            reading: None,
            online: false,
            world: -1,
        }
    }

    fn any_enabled(&self) -> bool {
        let c = &self.config;
        c.health
            || c.prayer
            || c.special_attack
            || c.run_energy
            || c.status_effects
            || c.skill_boosts
            || c.online_status
    }
}

fn single(name: &str, value: Value) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(name.to_string(), value);
    attributes
}

impl Tracker for VitalsTracker {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn on_tick(&mut self, ctx: &TickContext<'_>, _out: &mut Outbox) {
        if !self.any_enabled() || ctx.world.game_state() != GameState::LoggedIn {
            return;
        }

        self.reading = Some(Reading::sample(ctx.world));
        self.online = true;
        self.world = ctx.world.world_id();
    }

    fn snapshot(&self, player: &PlayerId) -> Snapshot {
        let mut snapshot = Snapshot::new();

        if let Some(reading) = &self.reading {
            if self.config.health {
                snapshot.insert(
                    EntityKey::new(player, "health"),
                    single("current_health", json!(reading.health)),
                );
            }
            if self.config.prayer {
                snapshot.insert(
                    EntityKey::new(player, "prayer"),
                    single("current_prayer", json!(reading.prayer)),
                );
            }
            if self.config.special_attack {
                snapshot.insert(
                    EntityKey::new(player, "special_attack"),
                    single("current_special_attack", json!(reading.special_attack)),
                );
            }
            if self.config.run_energy {
                snapshot.insert(
                    EntityKey::new(player, "run_energy"),
                    single("current_run_energy", json!(reading.run_energy)),
                );
            }
            if self.config.status_effects {
                snapshot.insert(
                    EntityKey::new(player, "status_effects"),
                    single("current_status_effects", json!(reading.status_effects)),
                );
            }
            if self.config.skill_boosts {
                for (skill, level) in &reading.skills {
                    snapshot.insert(
                        EntityKey::new(player, &format!("skill_{}", skill.name())),
                        single("virtual_level", json!(level)),
                    );
                }
            }
        }

        if self.config.online_status {
            let mut attributes = Attributes::new();
            attributes.insert("is_online".to_string(), json!(self.online));
            attributes.insert("world".to_string(), json!(self.world));
            snapshot.insert(EntityKey::new(player, "player_status"), attributes);
        }

        snapshot
    }

    fn on_config_changed(&mut self, key: &str, config: &BridgeConfig) {
        if key.starts_with("player.") {
            self.config = config.player.clone();
        }
    }

    fn on_signal(&mut self, signal: &LifecycleSignal, ctx: &SignalContext<'_>, _out: &mut Outbox) {
        if let LifecycleSignal::GameStateChanged { state } = signal {
            match state {
                GameState::LoggedIn => {
                    self.online = true;
                    self.world = ctx.world.world_id();
                }
                GameState::ConnectionLost | GameState::LoginScreen => {
                    self.online = false;
                    self.world = -1;
                }
                _ => {}
            }
        }
    }
}
