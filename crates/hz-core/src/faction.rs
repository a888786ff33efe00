//! Team membership and creature variants.

use std::fmt;

/// Which side an entity fights for.  Two entities are enemies when their
/// factions differ.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Faction {
    /// The undead.
    Horde,
    /// Player-controlled (or player-like) humans.
    Survivor,
}

impl Faction {
    pub const ALL: [Faction; 2] = [Faction::Horde, Faction::Survivor];

    #[inline]
    pub fn is_enemy_of(self, other: Faction) -> bool {
        self != other
    }

    /// The faction this one hunts.
    #[inline]
    pub fn opposing(self) -> Faction {
        match self {
            Faction::Horde    => Faction::Survivor,
            Faction::Survivor => Faction::Horde,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Faction::Horde    => "Horde",
            Faction::Survivor => "Survivor",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Creature template requested from the spawn queue.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZombieType {
    /// Regular walker, populated by partitions.
    #[default]
    Normal,
    /// Spawned on a timer near the survivors and already hunting.
    Stalker,
}

impl fmt::Display for ZombieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZombieType::Normal  => f.write_str("Normal"),
            ZombieType::Stalker => f.write_str("Stalker"),
        }
    }
}
