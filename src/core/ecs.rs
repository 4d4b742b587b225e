use bevy_ecs::prelude::*;

use crate::simulation::time::GameTime;

/// Build the entity arena with its baseline resources.
pub fn create_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameTime::default());
    world
}

/// Drop every entity while keeping resources such as the clock.
pub fn clear_entities(world: &mut World) {
    let entities: Vec<Entity> = world.iter_entities().map(|e| e.id()).collect();
    for entity in entities {
        world.despawn(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_starts_with_a_clock() {
        let mut world = create_world();
        assert_eq!(*world.resource::<GameTime>(), GameTime::default());
        world.spawn_empty();
        clear_entities(&mut world);
        assert_eq!(world.entities().len(), 0);
        assert!(world.get_resource::<GameTime>().is_some());
    }
}
