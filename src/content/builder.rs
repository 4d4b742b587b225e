use std::collections::HashMap;

use bevy_ecs::world::EntityWorldMut;

use crate::components::combat::Health;
use crate::components::creature::{ActionPoints, Behavior, Creature, Inventory, Skills};
use crate::components::item::Item;
use crate::components::world::Name;
use crate::content::repository::{ContentError, ContentResource, ResourceKind};

/// Turns one kind of content template into components on a freshly spawned
/// entity.
pub trait EntityBuilder: Send + Sync {
    fn kind(&self) -> ResourceKind;
    fn build(
        &self,
        resource: &ContentResource,
        entity: &mut EntityWorldMut<'_>,
    ) -> Result<(), ContentError>;
}

pub struct CreatureBuilder;

impl EntityBuilder for CreatureBuilder {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Species
    }

    fn build(
        &self,
        resource: &ContentResource,
        entity: &mut EntityWorldMut<'_>,
    ) -> Result<(), ContentError> {
        let species = resource.as_species()?;
        entity.insert((
            Name(species.name.clone()),
            Creature {
                species: resource.id.clone(),
                hostile: species.hostile,
            },
            Health::new(species.health),
            ActionPoints::new(species.action_points),
            Skills(species.skills.clone()),
            Behavior {
                kind: species.behavior,
            },
            Inventory::default(),
        ));
        Ok(())
    }
}

pub struct ItemBuilder;

impl EntityBuilder for ItemBuilder {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Item
    }

    fn build(
        &self,
        resource: &ContentResource,
        entity: &mut EntityWorldMut<'_>,
    ) -> Result<(), ContentError> {
        let item = resource.as_item()?;
        entity.insert((
            Name(item.name.clone()),
            Item {
                kind: resource.id.clone(),
                weight: item.weight,
            },
        ));
        Ok(())
    }
}

/// Kind-dispatched builder lookup.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: HashMap<ResourceKind, Box<dyn EntityBuilder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the creature and item builders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CreatureBuilder));
        registry.register(Box::new(ItemBuilder));
        registry
    }

    /// Returns the builder previously registered for the same kind, if any.
    pub fn register(&mut self, builder: Box<dyn EntityBuilder>) -> Option<Box<dyn EntityBuilder>> {
        self.builders.insert(builder.kind(), builder)
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&dyn EntityBuilder> {
        self.builders.get(&kind).map(|builder| builder.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    use crate::components::creature::BehaviorKind;
    use crate::content::repository::{ResourceBody, ResourceId, SpeciesDef};

    #[test]
    fn creature_builder_attaches_species_components() {
        let resource = ContentResource {
            id: ResourceId::new("base", "goblin"),
            body: ResourceBody::Species(SpeciesDef {
                name: "Goblin".to_string(),
                health: 12,
                action_points: 100,
                skills: Default::default(),
                behavior: BehaviorKind::Hunter,
                hostile: true,
            }),
        };
        let registry = BuilderRegistry::with_defaults();
        let builder = registry.get(resource.kind()).unwrap();

        let mut world = World::new();
        let mut entity = world.spawn_empty();
        builder.build(&resource, &mut entity).unwrap();
        let id = entity.id();

        assert_eq!(world.get::<Health>(id), Some(&Health::new(12)));
        assert!(world.get::<Creature>(id).unwrap().hostile);
        assert_eq!(world.get::<Behavior>(id).unwrap().kind, BehaviorKind::Hunter);
    }

    #[test]
    fn map_layouts_have_no_default_builder() {
        let registry = BuilderRegistry::with_defaults();
        assert!(registry.get(ResourceKind::MapLayout).is_none());
    }
}
