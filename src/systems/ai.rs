use bevy_ecs::entity::Entity;

use crate::components::creature::{Behavior, BehaviorKind};
use crate::components::task::MoveIntent;
use crate::components::world::{Player, Position};
use crate::core::error::SimError;
use crate::systems::{SimContext, SystemOutcome};

const STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// AI decision: pick the next step for a creature and leave it as a
/// `MoveIntent`. The player is driven by input instead and only continues
/// while it has a queued intent.
pub fn ai_system(ctx: &mut SimContext<'_>, entity: Entity) -> Result<SystemOutcome, SimError> {
    let world = ctx.store.world();
    if world.get::<Player>(entity).is_some() {
        return Ok(if world.get::<MoveIntent>(entity).is_some() {
            SystemOutcome::Continue
        } else {
            SystemOutcome::Done
        });
    }

    let Some(behavior) = world.get::<Behavior>(entity).copied() else {
        return Ok(SystemOutcome::Done);
    };
    let Some(position) = world.get::<Position>(entity).copied() else {
        return Ok(SystemOutcome::Done);
    };

    let step = match behavior.kind {
        BehaviorKind::Idle => None,
        BehaviorKind::Wander => Some(STEPS[(next_u64(ctx.rng) % STEPS.len() as u64) as usize]),
        BehaviorKind::Hunter => toward_player(ctx, position),
    };

    match step {
        Some((dx, dy)) => {
            ctx.store
                .world_mut()
                .entity_mut(entity)
                .insert(MoveIntent { dx, dy });
            Ok(SystemOutcome::Continue)
        }
        None => Ok(SystemOutcome::Done),
    }
}

/// One step (diagonals allowed) toward the player when both share a map.
fn toward_player(ctx: &mut SimContext<'_>, from: Position) -> Option<(i32, i32)> {
    let player = ctx.store.get(ctx.player).ok()?;
    let target = *ctx.store.world().get::<Position>(player)?;
    if target.map != from.map {
        return None;
    }
    let step = ((target.x - from.x).signum(), (target.y - from.y).signum());
    (step != (0, 0)).then_some(step)
}

pub(crate) fn next_u64(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1);
    *state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::world::EntityUid;
    use crate::systems::testing::{creature, player, store, MAP};
    use crate::systems::Rules;

    fn decide(store: &mut crate::persistence::EntityStore, entity: Entity, rng: &mut u64) -> SystemOutcome {
        let rules = Rules::default();
        let mut events = Vec::new();
        let mut ctx = SimContext {
            store,
            rules: &rules,
            active_map: MAP,
            player: EntityUid::PLAYER,
            events: &mut events,
            rng,
        };
        ai_system(&mut ctx, entity).unwrap()
    }

    #[test]
    fn hunter_steps_toward_player() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = store(&dir, 20, 20);
        player(&mut store, (2, 8));
        let hunter = creature(&mut store, EntityUid(7), (5, 5), true, BehaviorKind::Hunter, 100);

        assert_eq!(decide(&mut store, hunter, &mut 1), SystemOutcome::Continue);
        assert_eq!(
            store.world().get::<MoveIntent>(hunter),
            Some(&MoveIntent { dx: -1, dy: 1 })
        );
    }

    #[test]
    fn idle_is_done_and_wander_picks_an_orthogonal_step() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = store(&dir, 20, 20);
        let idle = creature(&mut store, EntityUid(1), (1, 1), false, BehaviorKind::Idle, 100);
        let wanderer = creature(&mut store, EntityUid(2), (9, 9), false, BehaviorKind::Wander, 100);

        assert_eq!(decide(&mut store, idle, &mut 1), SystemOutcome::Done);
        assert!(store.world().get::<MoveIntent>(idle).is_none());

        let mut rng = 42;
        for _ in 0..8 {
            assert_eq!(decide(&mut store, wanderer, &mut rng), SystemOutcome::Continue);
            let intent = *store.world().get::<MoveIntent>(wanderer).unwrap();
            assert_eq!(intent.dx.abs() + intent.dy.abs(), 1);
        }
    }

    #[test]
    fn player_needs_an_intent() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = store(&dir, 20, 20);
        let me = player(&mut store, (3, 3));
        assert_eq!(decide(&mut store, me, &mut 1), SystemOutcome::Done);

        store.world_mut().entity_mut(me).insert(MoveIntent { dx: 1, dy: 0 });
        assert_eq!(decide(&mut store, me, &mut 1), SystemOutcome::Continue);
    }

    #[test]
    fn lcg_is_deterministic() {
        let (mut a, mut b) = (9u64, 9u64);
        let xs: Vec<u64> = (0..4).map(|_| next_u64(&mut a)).collect();
        let ys: Vec<u64> = (0..4).map(|_| next_u64(&mut b)).collect();
        assert_eq!(xs, ys);
    }
}
