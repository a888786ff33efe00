//! Typed events raised and consumed around perception.
//!
//! Each travels on its own `EventChannel`, so a handler can never receive a
//! payload of the wrong shape.

use hz_core::EntityId;

/// Damage dealt to the receiving entity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DamageEvent {
    pub amount:     f32,
    pub instigator: Option<EntityId>,
}

/// The receiving entity died.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeathEvent {
    pub instigator: Option<EntityId>,
}

/// The receiving entity locked on to its first target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AggroTriggeredEvent {
    pub target: EntityId,
}

/// The receiving entity's aggro lapsed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AggroLostEvent {
    pub target: Option<EntityId>,
}
