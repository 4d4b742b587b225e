use bevy_ecs::entity::Entity;

use crate::components::creature::ActionPoints;
use crate::components::task::PendingAction;
use crate::core::error::SimError;
use crate::systems::{SimContext, SystemOutcome};

/// Action-point accounting. Restores the tick's share of points on the first
/// pass, then lets the entity through only while it can pay for a step. The
/// points on hand after this are recorded in `PendingAction::budget`.
pub fn action_system(ctx: &mut SimContext<'_>, entity: Entity) -> Result<SystemOutcome, SimError> {
    let world = ctx.store.world_mut();
    let Some(pending) = world.get::<PendingAction>(entity).copied() else {
        return Ok(SystemOutcome::Done);
    };
    let Some(mut points) = world.get_mut::<ActionPoints>(entity) else {
        return Ok(SystemOutcome::Done);
    };

    if !pending.restored {
        points.restore(pending.fraction);
    }
    let affordable = points.can_afford(ctx.rules.step_cost);
    let budget = points.current;

    if let Some(mut pending) = world.get_mut::<PendingAction>(entity) {
        pending.restored = true;
        pending.budget = budget;
    }

    Ok(if affordable {
        SystemOutcome::Continue
    } else {
        SystemOutcome::Done
    })
}
