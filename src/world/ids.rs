//! Client state cell and item ids read by the trackers.

// Player variables
pub const VARP_POISON: u32 = 102;
pub const VARP_SPECIAL_ATTACK: u32 = 300;
pub const VARP_NMZ_REWARD_POINTS: u32 = 1060;

// Account type (0 = normal, 2 = ultimate ironman)
pub const VARBIT_ACCOUNT_TYPE: u32 = 1777;
pub const ACCOUNT_TYPE_ULTIMATE: i32 = 2;

// Quest progress
pub const VARBIT_QUEST_HAND_IN_THE_SAND: u32 = 1527;

// Achievement diary completion flags
pub const VARBIT_DIARY_ARDOUGNE_MEDIUM: u32 = 4459;
pub const VARBIT_DIARY_WILDERNESS_EASY: u32 = 4466;
pub const VARBIT_DIARY_WESTERN_EASY: u32 = 4471;
pub const VARBIT_DIARY_KANDARIN_EASY: u32 = 4475;
pub const VARBIT_DIARY_VARROCK_EASY: u32 = 4479;
pub const VARBIT_DIARY_KOUREND_MEDIUM: u32 = 7926;

// Daily claim flags
pub const VARBIT_DAILY_HERB_BOXES: u32 = 3961;
pub const VARBIT_DAILY_STAVES: u32 = 4539;
pub const VARBIT_DAILY_RUNES: u32 = 4540;
pub const VARBIT_DAILY_ESSENCE: u32 = 4547;
pub const VARBIT_DAILY_SAND: u32 = 4549;
pub const VARBIT_DAILY_FLAX: u32 = 4559;
pub const VARBIT_DAILY_ARROWS: u32 = 4563;
pub const VARBIT_DAILY_DYNAMITE: u32 = 7939;

// Item containers
pub const CONTAINER_INVENTORY: i32 = 93;

// Items
pub const ITEM_BATTLESTAFF_NOTED: i32 = 1392;

/// Animation/pose id meaning "nothing playing"
pub const IDLE_ANIMATION: i32 = -1;
