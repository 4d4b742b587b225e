use bevy_ecs::entity::Entity;
use bevy_utils::tracing::{debug, info};

use crate::components::combat::{Collision, Health};
use crate::components::creature::Creature;
use crate::components::world::{EntityUid, Player};
use crate::core::error::SimError;
use crate::systems::{SimContext, SystemOutcome};
use crate::transport::ToUi;

pub const BASE_DAMAGE: i32 = 10;

/// Resolves a collision left by movement. Opposing sides (hostile against
/// non-hostile) trade a blow; a creature brought to zero health leaves the
/// store, except the player, who stays for the presentation side to handle.
pub fn combat_system(ctx: &mut SimContext<'_>, entity: Entity) -> Result<SystemOutcome, SimError> {
    let world = ctx.store.world_mut();
    let Some(collision) = world.get::<Collision>(entity).copied() else {
        return Ok(SystemOutcome::Continue);
    };
    world.entity_mut(entity).remove::<Collision>();

    let attacker_hostile = world.get::<Creature>(entity).map(|c| c.hostile);
    let attacker = world.get::<EntityUid>(entity).copied();

    let target = ctx.store.get(collision.with)?;
    let world = ctx.store.world_mut();
    let defender_hostile = world.get::<Creature>(target).map(|c| c.hostile);
    let (Some(attacker_hostile), Some(defender_hostile)) = (attacker_hostile, defender_hostile)
    else {
        return Ok(SystemOutcome::Done);
    };
    if attacker_hostile == defender_hostile {
        return Ok(SystemOutcome::Done);
    }

    let Some(mut health) = world.get_mut::<Health>(target) else {
        return Ok(SystemOutcome::Done);
    };
    let remaining = apply_damage(&mut *health, BASE_DAMAGE);
    let is_player = world.get::<Player>(target).is_some();
    debug!(attacker = ?attacker, target = %collision.with, remaining, "hit");

    ctx.events.push(ToUi::Damaged {
        uid: collision.with,
        amount: BASE_DAMAGE,
        remaining,
    });
    if remaining == 0 {
        info!(uid = %collision.with, "creature died");
        ctx.events.push(ToUi::Died {
            uid: collision.with,
        });
        if !is_player {
            ctx.store.remove(collision.with)?;
        }
    }
    Ok(SystemOutcome::Done)
}

fn apply_damage(health: &mut Health, amount: i32) -> i32 {
    health.current = (health.current - amount).max(0);
    health.current
}
