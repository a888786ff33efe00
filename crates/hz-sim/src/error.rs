use hz_behavior::BehaviorError;
use hz_core::CoreError;
use hz_perception::PerceptionError;
use hz_spatial::SpatialError;
use hz_steering::SteeringError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("console: {0}")]
    Command(String),

    #[error("behavior tree of {entity} failed: {source}")]
    Tree {
        entity: hz_core::EntityId,
        #[source]
        source: BehaviorError,
    },

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error(transparent)]
    Perception(#[from] PerceptionError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Steering(#[from] SteeringError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
