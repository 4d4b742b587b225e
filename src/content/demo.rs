use std::collections::BTreeMap;

use crate::components::creature::{BehaviorKind, SkillKind};
use crate::content::repository::{
    ContentError, ContentResource, ItemDef, LayoutPlacement, MapLayoutDef, ResourceBody,
    ResourceId, ResourceRepository, SpeciesDef,
};
use crate::world::map::RegionSpec;
use crate::world::terrain::{FLOOR, WALL, WATER};

pub const DEMO_MODULE: &str = "base";

/// A small starter module: the player species, two monsters, a coin and a
/// walled map with a pond.
pub fn demo_resources() -> Vec<ContentResource> {
    let mut human_skills = BTreeMap::new();
    human_skills.insert(SkillKind::Swim, 60);
    human_skills.insert(SkillKind::Melee, 10);

    let (width, height) = (40, 20);
    let wall = |x, y, w, h| RegionSpec {
        x,
        y,
        w,
        h,
        value: WALL,
    };

    vec![
        species("human", "Human", 30, 100, human_skills, BehaviorKind::Idle, false),
        species("goblin", "Goblin", 20, 100, BTreeMap::new(), BehaviorKind::Hunter, true),
        species("rat", "Rat", 5, 150, BTreeMap::new(), BehaviorKind::Wander, true),
        ContentResource {
            id: ResourceId::new(DEMO_MODULE, "coin"),
            body: ResourceBody::Item(ItemDef {
                name: "Coin".to_string(),
                weight: 1,
            }),
        },
        ContentResource {
            id: ResourceId::new(DEMO_MODULE, "start"),
            body: ResourceBody::MapLayout(MapLayoutDef {
                local_uid: 1,
                width,
                height,
                default_terrain: FLOOR,
                terrain: vec![
                    wall(0, 0, width, 1),
                    wall(0, height - 1, width, 1),
                    wall(0, 0, 1, height),
                    wall(width - 1, 0, 1, height),
                    RegionSpec {
                        x: 20,
                        y: 8,
                        w: 5,
                        h: 4,
                        value: WATER,
                    },
                ],
                elevation: vec![RegionSpec {
                    x: 20,
                    y: 8,
                    w: 5,
                    h: 4,
                    value: -1,
                }],
                placements: vec![
                    place("goblin", 30, 5),
                    place("rat", 10, 15),
                    place("coin", 5, 5),
                ],
                player_start: (3, 3),
            }),
        },
    ]
}

/// Write the demo module into `repo`. Returns how many resources were saved.
pub fn seed_demo(repo: &mut dyn ResourceRepository) -> Result<usize, ContentError> {
    let resources = demo_resources();
    for resource in &resources {
        repo.save(resource)?;
    }
    Ok(resources.len())
}

fn species(
    key: &str,
    name: &str,
    health: i32,
    action_points: i32,
    skills: BTreeMap<SkillKind, i32>,
    behavior: BehaviorKind,
    hostile: bool,
) -> ContentResource {
    ContentResource {
        id: ResourceId::new(DEMO_MODULE, key),
        body: ResourceBody::Species(SpeciesDef {
            name: name.to_string(),
            health,
            action_points,
            skills,
            behavior,
            hostile,
        }),
    }
}

fn place(key: &str, x: i32, y: i32) -> LayoutPlacement {
    LayoutPlacement {
        resource: ResourceId::new(DEMO_MODULE, key),
        x,
        y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ResourceKind, SqliteResourceRepository};

    #[test]
    fn seeds_every_kind() {
        let mut repo = SqliteResourceRepository::open_in_memory().unwrap();
        assert_eq!(seed_demo(&mut repo).unwrap(), 5);
        assert_eq!(repo.list_ids(ResourceKind::Species).unwrap().len(), 3);
        let start = repo.load(&ResourceId::new(DEMO_MODULE, "start")).unwrap();
        let layout = start.as_map_layout().unwrap();
        assert_eq!(layout.placements.len(), 3);
    }
}
