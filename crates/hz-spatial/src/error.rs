//! Spatial-subsystem error type.

use thiserror::Error;

use hz_core::{CoreError, PartitionId, SpawnerId};

/// Errors produced by `hz-spatial`.  All of them are level-authoring
/// mistakes: an id that was never created.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("partition {0} not found")]
    PartitionNotFound(PartitionId),

    #[error("spawner {0} not found")]
    SpawnerNotFound(SpawnerId),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
