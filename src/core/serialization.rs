use std::fs;
use std::io;
use std::path::Path;

use bevy_ecs::world::{EntityRef, EntityWorldMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::components::combat::Health;
use crate::components::creature::{ActionPoints, Behavior, Creature, Inventory, Skills};
use crate::components::item::Item;
use crate::components::world::{EntityUid, Name, Player, Position};

/// Closed set of persisted component variants, one arm per component type.
///
/// Transient components (`PendingAction`, `MoveIntent`, `Collision`) have no
/// arm and never reach disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentRecord {
    Name(Name),
    Position(Position),
    Player,
    Creature(Creature),
    ActionPoints(ActionPoints),
    Skills(Skills),
    Health(Health),
    Behavior(Behavior),
    Inventory(Inventory),
    Item(Item),
}

impl ComponentRecord {
    /// Insert this component onto a live entity, replacing any previous value.
    pub fn apply(self, entity: &mut EntityWorldMut<'_>) {
        match self {
            ComponentRecord::Name(c) => entity.insert(c),
            ComponentRecord::Position(c) => entity.insert(c),
            ComponentRecord::Player => entity.insert(Player),
            ComponentRecord::Creature(c) => entity.insert(c),
            ComponentRecord::ActionPoints(c) => entity.insert(c),
            ComponentRecord::Skills(c) => entity.insert(c),
            ComponentRecord::Health(c) => entity.insert(c),
            ComponentRecord::Behavior(c) => entity.insert(c),
            ComponentRecord::Inventory(c) => entity.insert(c),
            ComponentRecord::Item(c) => entity.insert(c),
        };
    }
}

/// Serialized component set of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub uid: EntityUid,
    pub components: Vec<ComponentRecord>,
}

/// Capture every persisted component of a live entity. `None` when the
/// entity carries no `EntityUid`.
pub fn capture_entity(entity: EntityRef<'_>) -> Option<EntityRecord> {
    let uid = *entity.get::<EntityUid>()?;
    let mut components = Vec::new();

    if let Some(c) = entity.get::<Name>() {
        components.push(ComponentRecord::Name(c.clone()));
    }
    if let Some(c) = entity.get::<Position>() {
        components.push(ComponentRecord::Position(*c));
    }
    if entity.contains::<Player>() {
        components.push(ComponentRecord::Player);
    }
    if let Some(c) = entity.get::<Creature>() {
        components.push(ComponentRecord::Creature(c.clone()));
    }
    if let Some(c) = entity.get::<ActionPoints>() {
        components.push(ComponentRecord::ActionPoints(*c));
    }
    if let Some(c) = entity.get::<Skills>() {
        components.push(ComponentRecord::Skills(c.clone()));
    }
    if let Some(c) = entity.get::<Health>() {
        components.push(ComponentRecord::Health(*c));
    }
    if let Some(c) = entity.get::<Behavior>() {
        components.push(ComponentRecord::Behavior(*c));
    }
    if let Some(c) = entity.get::<Inventory>() {
        components.push(ComponentRecord::Inventory(c.clone()));
    }
    if let Some(c) = entity.get::<Item>() {
        components.push(ComponentRecord::Item(c.clone()));
    }

    Some(EntityRecord { uid, components })
}

/// Rebuild an entity's components from a record.
pub fn apply_record(record: EntityRecord, entity: &mut EntityWorldMut<'_>) {
    entity.insert(record.uid);
    for component in record.components {
        component.apply(entity);
    }
}

/// Write any serializable value as pretty JSON. The file is replaced via a
/// sibling temp file so a crash mid-write never leaves a truncated record.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, json)?;
    fs::rename(staging, path)
}

/// Read a JSON file written by `write_json`.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> io::Result<T> {
    let data = fs::read_to_string(&path)?;
    serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
