use std::io;

use thiserror::Error;

use crate::components::world::EntityUid;
use crate::content::{ContentError, ResourceId};
use crate::persistence::StoreError;
use crate::spatial::SpatialError;
use crate::world::terrain::TerrainId;

/// Errors raised while simulating. Recoverable ones end the current operation
/// and are reported to the presentation side; the simulation keeps running.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("terrain id {0} is not in the terrain table")]
    UnknownTerrain(TerrainId),

    #[error("resource {0} names no module")]
    Unqualified(ResourceId),

    #[error("module {0} is not in the load order")]
    UnknownModule(String),

    #[error("entity {0} is not placed on a map")]
    Unplaced(EntityUid),

    #[error("no map is active")]
    NoActiveMap,

    #[error("save game I/O failed: {0}")]
    Io(#[from] io::Error),
}
