use super::{
    FarmingContract, GameState, PatchType, PlayerActivity, Skill, World, WorldPoint,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plain-data world state for one tick
///
/// Missing cells read as 0, missing patches as "never planted" (-1).
/// Patches listed in `guild_patches` belong to the farming guild and are
/// left out when the guild is ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldFrame {
    pub player_name: Option<String>,
    pub game_state: GameState,
    pub world: i32,
    pub position: Option<WorldPoint>,
    pub varbits: BTreeMap<u32, i32>,
    pub varps: BTreeMap<u32, i32>,
    pub boosted_levels: BTreeMap<Skill, i32>,
    pub run_energy: i32,
    pub activity: Option<PlayerActivity>,
    pub patches: BTreeMap<PatchType, i64>,
    pub guild_patches: BTreeMap<PatchType, i64>,
    pub contract: Option<FarmingContract>,
    pub birdhouse_completion: i64,
    pub farming_tick_offset: i32,
}

impl Default for WorldFrame {
    fn default() -> Self {
        Self {
            player_name: None,
            game_state: GameState::LoginScreen,
            world: -1,
            position: None,
            varbits: BTreeMap::new(),
            varps: BTreeMap::new(),
            boosted_levels: BTreeMap::new(),
            run_energy: 0,
            activity: None,
            patches: BTreeMap::new(),
            guild_patches: BTreeMap::new(),
            contract: None,
            birdhouse_completion: -1,
            farming_tick_offset: 0,
        }
    }
}

impl WorldFrame {
    /// Logged-in frame for `name` standing at `position` on world 301
    pub fn logged_in(name: &str, position: WorldPoint) -> Self {
        Self {
            player_name: Some(name.to_string()),
            game_state: GameState::LoggedIn,
            world: 301,
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Latest of two completion times; "never planted" loses to anything
fn combine_completion(a: i64, b: i64) -> i64 {
    match (a, b) {
        (-1, other) | (other, -1) => other,
        (a, b) => a.max(b),
    }
}

impl World for WorldFrame {
    fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    fn game_state(&self) -> GameState {
        self.game_state
    }

    fn world_id(&self) -> i32 {
        self.world
    }

    fn position(&self) -> Option<WorldPoint> {
        self.position
    }

    fn varbit(&self, id: u32) -> i32 {
        self.varbits.get(&id).copied().unwrap_or(0)
    }

    fn varp(&self, id: u32) -> i32 {
        self.varps.get(&id).copied().unwrap_or(0)
    }

    fn boosted_level(&self, skill: Skill) -> i32 {
        self.boosted_levels.get(&skill).copied().unwrap_or(0)
    }

    fn run_energy(&self) -> i32 {
        self.run_energy
    }

    fn activity(&self) -> Option<PlayerActivity> {
        self.activity
    }

    fn patch_completion(&self, patch: PatchType, ignore_farming_guild: bool) -> i64 {
        let outside = self.patches.get(&patch).copied().unwrap_or(-1);
        if ignore_farming_guild {
            return outside;
        }
        match self.guild_patches.get(&patch) {
            Some(&guild) => combine_completion(outside, guild),
            None => outside,
        }
    }

    fn farming_contract(&self) -> Option<FarmingContract> {
        self.contract.clone()
    }

    fn birdhouse_completion(&self) -> i64 {
        self.birdhouse_completion
    }

    fn raw_farming_tick_offset(&self) -> i32 {
        self.farming_tick_offset
    }
}
