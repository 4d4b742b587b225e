use bevy_ecs::entity::Entity;
use bevy_utils::tracing::debug;

use crate::components::combat::Collision;
use crate::components::creature::{ActionPoints, Creature, SkillKind, Skills};
use crate::components::task::MoveIntent;
use crate::components::world::{EntityUid, Position};
use crate::core::error::SimError;
use crate::systems::{SimContext, SystemOutcome};
use crate::transport::ToUi;
use crate::world::terrain::TerrainKind;

/// Movement and collision resolution for the entity's pending `MoveIntent`.
///
/// Blocked steps (map edge, solid terrain, liquid without the swim skill)
/// still cost a step. Bumping into a creature costs nothing and leaves a
/// `Collision` for the combat system.
pub fn movement_system(ctx: &mut SimContext<'_>, entity: Entity) -> Result<SystemOutcome, SimError> {
    let rules = ctx.rules;
    let world = ctx.store.world_mut();
    let Some(intent) = world.get::<MoveIntent>(entity).copied() else {
        return Ok(SystemOutcome::Done);
    };
    world.entity_mut(entity).remove::<MoveIntent>();

    let Some(uid) = world.get::<EntityUid>(entity).copied() else {
        return Ok(SystemOutcome::Done);
    };
    let Some(position) = world.get::<Position>(entity).copied() else {
        return Err(SimError::Unplaced(uid));
    };
    let swim = world
        .get::<Skills>(entity)
        .map_or(0, |skills| skills.value(SkillKind::Swim));

    let to = (position.x + intent.dx, position.y + intent.dy);
    let map = ctx.store.get_map(position.map)?;
    if !map.in_bounds(to.0, to.1) {
        return Ok(spend_step(ctx, entity));
    }
    let terrain = map.terrain_at(to.0, to.1);
    let occupants = map.entities_at(to.0, to.1);

    let Some(def) = rules.terrain.resolve(terrain) else {
        return Err(SimError::UnknownTerrain(terrain));
    };
    match def.kind {
        TerrainKind::Solid => return Ok(spend_step(ctx, entity)),
        TerrainKind::Liquid if swim < rules.swim_threshold => {
            debug!(%uid, swim, "cannot swim here");
            return Ok(spend_step(ctx, entity));
        }
        _ => {}
    }

    for other in occupants {
        if other == uid {
            continue;
        }
        let obstacle = ctx.store.get(other)?;
        if ctx.store.world().get::<Creature>(obstacle).is_some() {
            ctx.store
                .world_mut()
                .entity_mut(entity)
                .insert(Collision { with: other });
            ctx.events.push(ToUi::Collision {
                mover: uid,
                obstacle: other,
            });
            return Ok(SystemOutcome::Continue);
        }
    }

    let (map, world) = ctx.store.map_and_world(position.map)?;
    map.move_entity(uid, to.0, to.1)?;
    if let Some(mut placed) = world.get_mut::<Position>(entity) {
        placed.x = to.0;
        placed.y = to.1;
    }
    ctx.events.push(ToUi::EntityMoved {
        uid,
        map: position.map,
        from: (position.x, position.y),
        to,
    });
    Ok(spend_step(ctx, entity))
}

/// Pay for one step. Continue only while another step is affordable.
fn spend_step(ctx: &mut SimContext<'_>, entity: Entity) -> SystemOutcome {
    let cost = ctx.rules.step_cost;
    match ctx.store.world_mut().get_mut::<ActionPoints>(entity) {
        Some(mut points) => {
            points.spend(cost);
            if points.can_afford(cost) {
                SystemOutcome::Continue
            } else {
                SystemOutcome::Done
            }
        }
        None => SystemOutcome::Done,
    }
}
