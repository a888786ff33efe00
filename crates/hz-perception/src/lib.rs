//! `hz-perception`: how horde agents notice things.
//!
//! Entities that can be noticed register a [`Sensable`] (faction, priority,
//! head offset).  Entities that notice own a [`Sensing`] (sight cone plus
//! near sense, throttled to every 8–12 ticks) and, for hostiles, an
//! [`Aggro`] that turns detections into a target lock.  [`Perception`]
//! holds all three for a level and runs them in a fixed order.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`sensable`]    | `Sensable`, `SensableRegistry`                            |
//! | [`sensing`]     | `Sensing`, `SensingConfig`, `DetectionDelta`, `SenseWorld`|
//! | [`aggro`]       | `Aggro`, `AggroConfig`, `AggroEffect`                     |
//! | [`events`]      | `DamageEvent`, `DeathEvent`, aggro triggered/lost events  |
//! | [`perception`]  | `Perception`: registration, reports, the tick pass        |
//! | [`error`]       | `PerceptionError`, `PerceptionResult<T>`                  |

pub mod aggro;
pub mod error;
pub mod events;
pub mod perception;
pub mod sensable;
pub mod sensing;

#[cfg(test)]
mod tests;

pub use aggro::{Aggro, AggroConfig, AggroEffect};
pub use error::{PerceptionError, PerceptionResult};
pub use events::{AggroLostEvent, AggroTriggeredEvent, DamageEvent, DeathEvent};
pub use perception::{AggroChange, Perception};
pub use sensable::{Sensable, SensableRegistry};
pub use sensing::{DetectionDelta, SenseWorld, Sensing, SensingConfig};
