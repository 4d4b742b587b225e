use std::collections::VecDeque;

use bevy_ecs::entity::Entity;
use bevy_utils::tracing::{debug, error, warn};

use crate::components::creature::{ActionPoints, Creature};
use crate::components::task::PendingAction;
use crate::components::world::EntityUid;
use crate::core::config::QueueDiscipline;
use crate::core::error::SimError;
use crate::systems::{run_pipeline, SimContext, SystemOutcome};
use crate::transport::ToUi;

/// Entities that still owe work this tick.
#[derive(Debug)]
pub struct WorkQueue {
    items: VecDeque<Entity>,
    discipline: QueueDiscipline,
}

impl WorkQueue {
    pub fn new(discipline: QueueDiscipline) -> Self {
        Self {
            items: VecDeque::new(),
            discipline,
        }
    }

    /// Queue `ordered` so that it pops in the given order.
    pub fn seed(&mut self, ordered: &[Entity]) {
        match self.discipline {
            QueueDiscipline::Lifo => self.items.extend(ordered.iter().rev().copied()),
            QueueDiscipline::Fifo => self.items.extend(ordered.iter().copied()),
        }
    }

    pub fn push(&mut self, entity: Entity) {
        self.items.push_back(entity);
    }

    pub fn pop(&mut self) -> Option<Entity> {
        match self.discipline {
            QueueDiscipline::Lifo => self.items.pop_back(),
            QueueDiscipline::Fifo => self.items.pop_front(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub fraction: f32,
    /// Uids in the order they were popped; an entity appears once per pass.
    pub passes: Vec<EntityUid>,
    pub failed: Vec<EntityUid>,
    /// Entities still queued when the tick ended. Always zero.
    pub leftover: usize,
}

/// Drives one tick: tag, seed, drain.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    discipline: QueueDiscipline,
}

impl Scheduler {
    pub fn new(discipline: QueueDiscipline) -> Self {
        Self { discipline }
    }

    pub fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    pub fn run_tick(&self, ctx: &mut SimContext<'_>, fraction: f32) -> Result<TickReport, SimError> {
        let seed = tag_participants(ctx, fraction)?;
        let mut queue = WorkQueue::new(self.discipline);
        queue.seed(&seed);

        let mut report = TickReport {
            fraction,
            ..TickReport::default()
        };

        while let Some(entity) = queue.pop() {
            let world = ctx.store.world();
            if world.get::<PendingAction>(entity).is_none() {
                // Despawned (killed) or already finished.
                continue;
            }
            let Some(uid) = world.get::<EntityUid>(entity).copied() else {
                continue;
            };
            report.passes.push(uid);

            match run_pipeline(ctx, entity) {
                Ok(SystemOutcome::Continue) => {
                    if spent_this_pass(ctx, entity) {
                        queue.push(entity);
                    } else {
                        warn!(%uid, "entity asked to continue without spending points");
                        finish(ctx, entity);
                    }
                }
                Ok(SystemOutcome::Done) => finish(ctx, entity),
                Err(err) => {
                    error!(%uid, "entity abandoned for this tick: {}", err);
                    ctx.events.push(ToUi::Message {
                        text: format!("entity {}: {}", uid, err),
                    });
                    report.failed.push(uid);
                    finish(ctx, entity);
                }
            }
        }

        report.leftover = queue.len();
        debug!(passes = report.passes.len(), fraction, "tick drained");
        Ok(report)
    }
}

/// Mark the player and every creature on the active map, returning them in
/// processing order: player first, then map entities by uid.
fn tag_participants(ctx: &mut SimContext<'_>, fraction: f32) -> Result<Vec<Entity>, SimError> {
    let mut seed = Vec::new();

    match ctx.store.get(ctx.player) {
        Ok(player) => {
            ctx.store
                .world_mut()
                .entity_mut(player)
                .insert(PendingAction::new(fraction));
            seed.push(player);
        }
        Err(err) => warn!("player not available this tick: {}", err),
    }

    let listed = ctx
        .store
        .get_map(ctx.active_map)
        .map(|map| map.all_entities());
    let uids = match listed {
        Ok(uids) => uids,
        Err(err) => {
            for entity in seed {
                finish(ctx, entity);
            }
            return Err(err.into());
        }
    };
    for uid in uids {
        if uid == ctx.player {
            continue;
        }
        let entity = match ctx.store.get(uid) {
            Ok(entity) => entity,
            Err(err) => {
                warn!(%uid, "skipping placed entity: {}", err);
                continue;
            }
        };
        let world = ctx.store.world_mut();
        if world.get::<Creature>(entity).is_some() {
            world.entity_mut(entity).insert(PendingAction::new(fraction));
            seed.push(entity);
        }
    }
    Ok(seed)
}

/// Whether the entity paid for something since action accounting recorded its
/// budget. Points restored earlier in the same pass do not count against it.
fn spent_this_pass(ctx: &SimContext<'_>, entity: Entity) -> bool {
    let world = ctx.store.world();
    match (
        world.get::<PendingAction>(entity),
        world.get::<ActionPoints>(entity),
    ) {
        (Some(pending), Some(points)) => points.current < pending.budget,
        _ => false,
    }
}

fn finish(ctx: &mut SimContext<'_>, entity: Entity) {
    if let Some(mut entity) = ctx.store.world_mut().get_entity_mut(entity) {
        entity.remove::<PendingAction>();
    }
}
