//! Per-agent key/value store shared by the nodes of one tree.
//!
//! Keys are declared up front (usually at spawn).  Reading or writing a key
//! that was never declared is an authoring defect and returns
//! [`BehaviorError::UndeclaredKey`]; there is no silent default.

use std::fmt;

use hz_core::{EntityId, EntityLocator, Vec3};
use rustc_hash::FxHashMap;

use crate::{BehaviorError, BehaviorResult};

/// A blackboard value.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BbValue {
    Vec3(Vec3),
    Entity(EntityId),
    Float(f32),
    Int(i32),
    Bool(bool),
    Text(String),
    /// Declared but holding nothing, e.g. a target slot before first sight.
    #[default]
    Unset,
}

impl BbValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BbValue::Vec3(_)   => "a position",
            BbValue::Entity(_) => "an entity",
            BbValue::Float(_)  => "a float",
            BbValue::Int(_)    => "an int",
            BbValue::Bool(_)   => "a bool",
            BbValue::Text(_)   => "text",
            BbValue::Unset     => "nothing",
        }
    }
}

impl fmt::Display for BbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BbValue::Vec3(v)   => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            BbValue::Entity(e) => write!(f, "{e}"),
            BbValue::Float(x)  => write!(f, "{x}"),
            BbValue::Int(x)    => write!(f, "{x}"),
            BbValue::Bool(b)   => f.write_str(if *b { "True" } else { "False" }),
            BbValue::Text(s)   => f.write_str(s),
            BbValue::Unset     => f.write_str("null"),
        }
    }
}

impl From<Vec3> for BbValue {
    fn from(v: Vec3) -> Self {
        BbValue::Vec3(v)
    }
}

impl From<EntityId> for BbValue {
    fn from(e: EntityId) -> Self {
        BbValue::Entity(e)
    }
}

impl From<f32> for BbValue {
    fn from(x: f32) -> Self {
        BbValue::Float(x)
    }
}

impl From<i32> for BbValue {
    fn from(x: i32) -> Self {
        BbValue::Int(x)
    }
}

impl From<bool> for BbValue {
    fn from(b: bool) -> Self {
        BbValue::Bool(b)
    }
}

impl From<&str> for BbValue {
    fn from(s: &str) -> Self {
        BbValue::Text(s.to_owned())
    }
}

impl From<String> for BbValue {
    fn from(s: String) -> Self {
        BbValue::Text(s)
    }
}

// ── Blackboard ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Blackboard {
    entries: FxHashMap<String, BbValue>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key` with an initial value, replacing any earlier declaration.
    pub fn declare(&mut self, key: impl Into<String>, value: impl Into<BbValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`declare`][Self::declare].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<BbValue>) -> Self {
        self.declare(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn get(&self, key: &str) -> BehaviorResult<&BbValue> {
        self.entries
            .get(key)
            .ok_or_else(|| BehaviorError::UndeclaredKey { key: key.to_owned() })
    }

    /// Overwrite a declared key.
    pub fn set(&mut self, key: &str, value: impl Into<BbValue>) -> BehaviorResult<()> {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(BehaviorError::UndeclaredKey { key: key.to_owned() }),
        }
    }

    /// Resolve `key` to a world position.
    ///
    /// Positions resolve to themselves and entities to where `entities`
    /// says they are.  `Ok(None)` means there is nothing to go to right now
    /// (an unset slot or a despawned entity).
    pub fn point(&self, key: &str, entities: &dyn EntityLocator) -> BehaviorResult<Option<Vec3>> {
        match self.get(key)? {
            BbValue::Vec3(v)   => Ok(Some(*v)),
            BbValue::Entity(e) => Ok(entities.position(*e)),
            BbValue::Unset     => Ok(None),
            other => Err(BehaviorError::TypeMismatch {
                key:      key.to_owned(),
                expected: "a position or an entity",
                found:    other.kind_name(),
            }),
        }
    }

    /// Resolve `key` to an entity; `Ok(None)` for an unset slot.
    pub fn entity(&self, key: &str) -> BehaviorResult<Option<EntityId>> {
        match self.get(key)? {
            BbValue::Entity(e) => Ok(Some(*e)),
            BbValue::Unset     => Ok(None),
            other => Err(BehaviorError::TypeMismatch {
                key:      key.to_owned(),
                expected: "an entity",
                found:    other.kind_name(),
            }),
        }
    }

    /// Resolve `key` to text; `Ok(None)` for an unset slot.
    pub fn text(&self, key: &str) -> BehaviorResult<Option<&str>> {
        match self.get(key)? {
            BbValue::Text(s) => Ok(Some(s.as_str())),
            BbValue::Unset   => Ok(None),
            other => Err(BehaviorError::TypeMismatch {
                key:      key.to_owned(),
                expected: "text",
                found:    other.kind_name(),
            }),
        }
    }
}
