use serde::{Deserialize, Serialize};
use std::fmt;


/// Prefix every hub-side entity id carries
pub const ENTITY_PREFIX: &str = "sensor.runelite_";

/// Normalize free text into a key segment
///
/// Rules:
/// - ASCII lowercase
/// - Every character outside [a-z0-9_] becomes "_"
/// - Runs of "_" collapse into one
/// - Leading/trailing "_" are trimmed
///
/// Normalization is idempotent: `slug(slug(x)) == slug(x)`.
///
/// # Examples
///
/// ```
/// use tickbridge::entity::slug;
///
/// assert_eq!(slug("Zezima"), "zezima");
/// assert_eq!(slug("  Iron  Man 99 "), "iron_man_99");
/// assert_eq!(slug("__a--b__"), "a_b");
/// ```
pub fn slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = true; // suppresses leading separators

    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }

    out
}

/// Normalized identity of the logged-in player
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Build from a raw display name.
    ///
    /// Returns None when the name normalizes to nothing; callers treat that
    /// the same as "not logged in".
    pub fn from_display_name(raw: &str) -> Option<Self> {
        let normalized = slug(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable hub-side identity of one entity, also the aggregator's dedup key
///
/// Format: "sensor.runelite_{player}_{suffix}"
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Compose a key from a player and a domain suffix (suffix is slugged)
    ///
    /// ```
    /// use tickbridge::entity::{EntityKey, PlayerId};
    ///
    /// let player = PlayerId::from_display_name("Lord Farmer").unwrap();
    /// let key = EntityKey::new(&player, "herb_patch");
    /// assert_eq!(key.as_str(), "sensor.runelite_lord_farmer_herb_patch");
    /// ```
    pub fn new(player: &PlayerId, suffix: &str) -> Self {
        Self(format!("{}{}_{}", ENTITY_PREFIX, player.as_str(), slug(suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
