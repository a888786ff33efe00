//! Perception error type.

use thiserror::Error;

use hz_core::{CoreError, EntityId};

#[derive(Debug, Error)]
pub enum PerceptionError {
    /// Sensing and aggro both need the entity's own faction and head offset.
    #[error("entity {0} senses but is not registered as sensable")]
    NotSensable(EntityId),

    #[error("entity {0} has aggro but no sensing")]
    NoSensing(EntityId),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type PerceptionResult<T> = Result<T, PerceptionError>;
