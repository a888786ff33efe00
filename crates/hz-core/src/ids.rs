//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can key `BTreeMap`s (which the
//! registries use for deterministic iteration order) without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Any simulated thing with a position: zombies, survivors, props.
    pub struct EntityId(u32);
}

typed_id! {
    /// Identity of a behavior-tree node, unique within one tree.
    ///
    /// Serialized trees write `-1` for nodes that were never assigned an id;
    /// those load as `NodeId::INVALID`.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a spatial partition in the level's partition graph.
    pub struct PartitionId(u16);
}

typed_id! {
    /// Index of a spawn point.  Spawn points are owned by exactly one partition.
    pub struct SpawnerId(u32);
}

impl NodeId {
    /// Parse the signed integer form used by serialized trees.
    pub fn from_signed(raw: i64) -> Option<NodeId> {
        if raw < 0 {
            return Some(NodeId::INVALID);
        }
        u32::try_from(raw).ok().map(NodeId)
    }

    /// The signed integer form used by serialized trees.
    pub fn to_signed(self) -> i64 {
        if self.is_valid() { self.0 as i64 } else { -1 }
    }
}
