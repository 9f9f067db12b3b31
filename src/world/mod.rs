//! Read-only world-state queries and lifecycle signals.
//!
//! The game client is an external collaborator. Trackers only see it through
//! the [`World`] trait; [`WorldFrame`] is a plain-data implementation used by
//! the replay runner and the tests.

use serde::{Deserialize, Serialize};

mod frame;
pub mod ids;

pub use frame::WorldFrame;

/// Grid position in the simulated world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
}

impl WorldPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, plane: 0 }
    }

    /// Chebyshev distance: max of the absolute coordinate deltas
    pub fn distance_to(&self, other: &WorldPoint) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy)
    }
}

/// Client connection state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    LoginScreen,
    LoggingIn,
    LoggedIn,
    Loading,
    Hopping,
    ConnectionLost,
}

/// Skills whose boosted level is mirrored
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Attack,
    Defence,
    Strength,
    Hitpoints,
    Ranged,
    Prayer,
    Magic,
    Cooking,
    Woodcutting,
    Fletching,
    Fishing,
    Firemaking,
    Crafting,
    Smithing,
    Mining,
    Herblore,
    Agility,
    Thieving,
    Slayer,
    Farming,
    Runecraft,
    Hunter,
    Construction,
}

impl Skill {
    pub const ALL: [Skill; 23] = [
        Skill::Attack,
        Skill::Defence,
        Skill::Strength,
        Skill::Hitpoints,
        Skill::Ranged,
        Skill::Prayer,
        Skill::Magic,
        Skill::Cooking,
        Skill::Woodcutting,
        Skill::Fletching,
        Skill::Fishing,
        Skill::Firemaking,
        Skill::Crafting,
        Skill::Smithing,
        Skill::Mining,
        Skill::Herblore,
        Skill::Agility,
        Skill::Thieving,
        Skill::Slayer,
        Skill::Farming,
        Skill::Runecraft,
        Skill::Hunter,
        Skill::Construction,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Skill::Attack => "attack",
            Skill::Defence => "defence",
            Skill::Strength => "strength",
            Skill::Hitpoints => "hitpoints",
            Skill::Ranged => "ranged",
            Skill::Prayer => "prayer",
            Skill::Magic => "magic",
            Skill::Cooking => "cooking",
            Skill::Woodcutting => "woodcutting",
            Skill::Fletching => "fletching",
            Skill::Fishing => "fishing",
            Skill::Firemaking => "firemaking",
            Skill::Crafting => "crafting",
            Skill::Smithing => "smithing",
            Skill::Mining => "mining",
            Skill::Herblore => "herblore",
            Skill::Agility => "agility",
            Skill::Thieving => "thieving",
            Skill::Slayer => "slayer",
            Skill::Farming => "farming",
            Skill::Runecraft => "runecraft",
            Skill::Hunter => "hunter",
            Skill::Construction => "construction",
        }
    }
}

/// Growth slot categories known to the client's time tracking
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchType {
    Allotment,
    Flower,
    Herb,
    Tree,
    FruitTree,
    Hops,
    Bush,
    Grape,
    Special,
    Hardwood,
    Redwood,
    Seaweed,
    Calquat,
    Celastrus,
    Cactus,
    Mushroom,
    Belladonna,
    Hespori,
    Crystal,
    Anima,
    BigCompost,
}

impl PatchType {
    pub const ALL: [PatchType; 21] = [
        PatchType::Allotment,
        PatchType::Flower,
        PatchType::Herb,
        PatchType::Tree,
        PatchType::FruitTree,
        PatchType::Hops,
        PatchType::Bush,
        PatchType::Grape,
        PatchType::Special,
        PatchType::Hardwood,
        PatchType::Redwood,
        PatchType::Seaweed,
        PatchType::Calquat,
        PatchType::Celastrus,
        PatchType::Cactus,
        PatchType::Mushroom,
        PatchType::Belladonna,
        PatchType::Hespori,
        PatchType::Crystal,
        PatchType::Anima,
        PatchType::BigCompost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatchType::Allotment => "allotment",
            PatchType::Flower => "flower",
            PatchType::Herb => "herb",
            PatchType::Tree => "tree",
            PatchType::FruitTree => "fruit_tree",
            PatchType::Hops => "hops",
            PatchType::Bush => "bush",
            PatchType::Grape => "grape",
            PatchType::Special => "special",
            PatchType::Hardwood => "hardwood",
            PatchType::Redwood => "redwood",
            PatchType::Seaweed => "seaweed",
            PatchType::Calquat => "calquat",
            PatchType::Celastrus => "celastrus",
            PatchType::Cactus => "cactus",
            PatchType::Mushroom => "mushroom",
            PatchType::Belladonna => "belladonna",
            PatchType::Hespori => "hespori",
            PatchType::Crystal => "crystal",
            PatchType::Anima => "anima",
            PatchType::BigCompost => "big_compost",
        }
    }
}

/// Farming contract currently assigned to the player
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmingContract {
    pub crop: String,
    pub patch: PatchType,
    /// Same encoding as patch completion times
    pub completion_time: i64,
}

/// What the local player is doing right now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerActivity {
    pub animation: i32,
    pub pose: i32,
    pub idle_pose: i32,
    #[serde(default)]
    pub interacting: bool,
}

/// Chat line channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    GameMessage,
    MesBox,
    Other,
}

/// One stack in an item container
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i32,
    pub quantity: i32,
}

/// Discrete, non-periodic events delivered outside the tick cadence
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleSignal {
    GameStateChanged { state: GameState },
    ChatMessage { chat: ChatKind, text: String },
    ItemContainerChanged { container: i32, items: Vec<Item> },
    PlayerDespawned,
}

/// Read-only world-state queries the trackers depend on
pub trait World {
    /// Raw display name of the local player, None when not logged in
    fn player_name(&self) -> Option<&str>;

    fn game_state(&self) -> GameState;

    /// Current world number
    fn world_id(&self) -> i32;

    fn position(&self) -> Option<WorldPoint>;

    /// Named numeric state cell (bit-packed flag)
    fn varbit(&self, id: u32) -> i32;

    /// Named numeric state cell (player variable)
    fn varp(&self, id: u32) -> i32;

    fn boosted_level(&self, skill: Skill) -> i32;

    /// Raw run energy, 0..=10_000
    fn run_energy(&self) -> i32;

    fn activity(&self) -> Option<PlayerActivity>;

    /// Completion epoch seconds for a growth slot category.
    ///
    /// Encoding: -1 never planted, 0 ready, `i64::MAX` occupied by another
    /// crop, otherwise the completion epoch second.
    fn patch_completion(&self, patch: PatchType, ignore_farming_guild: bool) -> i64;

    fn farming_contract(&self) -> Option<FarmingContract>;

    /// Birdhouse completion, same encoding as `patch_completion`
    fn birdhouse_completion(&self) -> i64;

    /// Profile-scoped farming tick offset as stored by the client
    fn raw_farming_tick_offset(&self) -> i32;
}
