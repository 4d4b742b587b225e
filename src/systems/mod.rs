pub mod action;
pub mod ai;
pub mod combat;
pub mod movement;

use bevy_ecs::entity::Entity;

use crate::components::world::{EntityUid, MapUid};
use crate::core::error::SimError;
use crate::persistence::EntityStore;
use crate::transport::ToUi;
use crate::world::terrain::TerrainTable;

pub use action::action_system;
pub use ai::ai_system;
pub use combat::{combat_system, BASE_DAMAGE};
pub use movement::movement_system;

/// Result of one system's pass over one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOutcome {
    /// Hand the entity to the next system (or back to the queue).
    Continue,
    /// The entity is finished for this tick.
    Done,
}

/// Game rules the systems read.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub step_cost: i32,
    pub swim_threshold: i32,
    pub terrain: TerrainTable,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            step_cost: 100,
            swim_threshold: 50,
            terrain: TerrainTable::default(),
        }
    }
}

/// Everything a system may touch during a tick.
pub struct SimContext<'a> {
    pub store: &'a mut EntityStore,
    pub rules: &'a Rules,
    pub active_map: MapUid,
    pub player: EntityUid,
    pub events: &'a mut Vec<ToUi>,
    pub rng: &'a mut u64,
}

pub type SystemFn = fn(&mut SimContext<'_>, Entity) -> Result<SystemOutcome, SimError>;

/// Fixed per-entity pipeline, in execution order.
pub const PIPELINE: [(&str, SystemFn); 4] = [
    ("action", action_system),
    ("ai", ai_system),
    ("movement", movement_system),
    ("combat", combat_system),
];

/// Run one entity through the pipeline. Stops at the first `Done`.
pub fn run_pipeline(ctx: &mut SimContext<'_>, entity: Entity) -> Result<SystemOutcome, SimError> {
    for (_, system) in PIPELINE {
        if system(ctx, entity)? == SystemOutcome::Done {
            return Ok(SystemOutcome::Done);
        }
    }
    Ok(SystemOutcome::Continue)
}
