use std::io;

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;
use bevy_utils::tracing::{debug, warn};
use thiserror::Error;

use crate::components::task::{MoveIntent, PendingAction};
use crate::components::world::{EntityUid, MapUid, ModuleUid, Position};
use crate::content::{BuilderRegistry, ContentError, ContentResource, ResourceId, ResourceKind};
use crate::core::ecs::{clear_entities, create_world};
use crate::core::serialization::{apply_record, capture_entity};
use crate::persistence::cache::LruCache;
use crate::persistence::files::SaveFiles;
use crate::persistence::modules::{ModuleError, ModuleRegistry};
use crate::spatial::SpatialError;
use crate::world::map::GameMap;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity {0} is neither cached nor on disk")]
    MissingEntity(EntityUid),

    #[error("map {0} is neither cached nor on disk")]
    MissingMap(MapUid),

    #[error("uid {0} is already in use")]
    UidInUse(EntityUid),

    #[error("no builder registered for {0:?} resources")]
    UnregisteredBuilder(ResourceKind),

    #[error("building {id} failed: {source}")]
    Build {
        id: ResourceId,
        source: ContentError,
    },

    #[error("persistence I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Module(#[from] ModuleError),
}

#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub entity_capacity: usize,
    pub map_capacity: usize,
    pub leaf_capacity: usize,
}

/// Single source of truth for live entities and maps.
///
/// Live entities sit in a bevy `World` arena and are indexed by uid through
/// a bounded LRU. Going over capacity evicts the least recently used entries,
/// writing each one to the temp root first; a later `get` reloads it. Maps
/// follow the same pattern in their own cache.
pub struct EntityStore {
    world: World,
    live: LruCache<EntityUid, Entity>,
    maps: LruCache<MapUid, GameMap>,
    pinned_map: Option<MapUid>,
    files: SaveFiles,
    modules: ModuleRegistry,
    builders: BuilderRegistry,
    leaf_capacity: usize,
}

impl EntityStore {
    /// Open a store over `files`, picking up the module table left in the
    /// temp root by an earlier session.
    pub fn open(
        files: SaveFiles,
        builders: BuilderRegistry,
        limits: StoreLimits,
    ) -> Result<Self, StoreError> {
        let modules = match files.read_modules()? {
            Some(table) => ModuleRegistry::restore(&table, &[])?,
            None => ModuleRegistry::new(),
        };
        Ok(Self {
            world: create_world(),
            live: LruCache::new(limits.entity_capacity),
            maps: LruCache::new(limits.map_capacity),
            pinned_map: None,
            files,
            modules,
            builders,
            leaf_capacity: limits.leaf_capacity,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn files(&self) -> &SaveFiles {
        &self.files
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn builders_mut(&mut self) -> &mut BuilderRegistry {
        &mut self.builders
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }

    /// Register content modules in load order.
    pub fn register_modules(&mut self, load_order: &[String]) -> Result<Vec<ModuleUid>, StoreError> {
        let mut uids = Vec::with_capacity(load_order.len());
        for name in load_order {
            uids.push(self.modules.register(name)?);
        }
        Ok(uids)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, uid: EntityUid) -> bool {
        self.live.contains(&uid)
    }

    /// True when the uid is cached or has a file in the temp root.
    pub fn contains(&self, uid: EntityUid) -> bool {
        self.live.contains(&uid) || self.files.entity_exists(uid)
    }

    pub fn uid_of(&self, entity: Entity) -> Option<EntityUid> {
        self.world.get::<EntityUid>(entity).copied()
    }

    /// The live handle for `uid`, reloading it from disk when it was evicted.
    pub fn get(&mut self, uid: EntityUid) -> Result<Entity, StoreError> {
        if let Some(entity) = self.live.get(&uid).copied() {
            return Ok(entity);
        }
        if !self.files.entity_exists(uid) {
            return Err(StoreError::MissingEntity(uid));
        }

        let record = self.files.read_entity(uid)?;
        let mut spawned = self.world.spawn_empty();
        apply_record(record, &mut spawned);
        let entity = spawned.id();
        self.live.insert(uid, entity);
        debug!(%uid, "entity reloaded from disk");

        self.enforce_capacity(Some(uid))?;
        Ok(entity)
    }

    /// Build a new entity from a content template.
    pub fn create(&mut self, uid: EntityUid, resource: &ContentResource) -> Result<Entity, StoreError> {
        if self.contains(uid) {
            return Err(StoreError::UidInUse(uid));
        }
        let Some(builder) = self.builders.get(resource.kind()) else {
            return Err(StoreError::UnregisteredBuilder(resource.kind()));
        };

        let mut spawned = self.world.spawn(uid);
        if let Err(source) = builder.build(resource, &mut spawned) {
            spawned.despawn();
            return Err(StoreError::Build {
                id: resource.id.clone(),
                source,
            });
        }
        let entity = spawned.id();

        self.modules.reserve_local(uid.module(), uid.local());
        self.live.insert(uid, entity);
        debug!(%uid, resource = %resource.id, "entity created");

        self.enforce_capacity(Some(uid))?;
        Ok(entity)
    }

    /// Start tracking an entity that was spawned straight into the arena.
    pub fn adopt(&mut self, uid: EntityUid, entity: Entity) -> Result<(), StoreError> {
        if self.contains(uid) {
            return Err(StoreError::UidInUse(uid));
        }
        let Some(mut spawned) = self.world.get_entity_mut(entity) else {
            return Err(StoreError::MissingEntity(uid));
        };
        spawned.insert(uid);
        self.modules.reserve_local(uid.module(), uid.local());
        self.live.insert(uid, entity);
        self.enforce_capacity(Some(uid))
    }

    /// Evict whatever exceeds capacity now that tick markers are gone.
    pub fn trim(&mut self) -> Result<(), StoreError> {
        self.enforce_capacity(None)
    }

    /// Drop the entity: off its map, out of the cache, and its temp-root file
    /// deleted.
    pub fn remove(&mut self, uid: EntityUid) -> Result<(), StoreError> {
        let entity = self.get(uid)?;
        let position = self.world.get::<Position>(entity).copied();

        if let Some(position) = position {
            let map = self.map_mut(position.map)?;
            if let Err(err) = map.remove_entity(uid) {
                warn!(%uid, map = %position.map, "removed entity was not indexed: {}", err);
            }
        }

        self.world.despawn(entity);
        self.live.remove(&uid);
        self.files.delete_entity(uid)?;
        debug!(%uid, "entity removed");
        Ok(())
    }

    /// Hand out a uid in `module` that nothing live or on disk uses.
    pub fn generate_uid(&mut self, module: ModuleUid) -> Result<EntityUid, StoreError> {
        loop {
            let local = self.modules.allocate_local(module)?;
            let uid = EntityUid::compose(module, local)
                .ok_or(ModuleError::LocalIdsExhausted(module))?;
            if !self.contains(uid) {
                return Ok(uid);
            }
        }
    }

    /// Write one entity back to disk and drop it from memory. Returns false
    /// when it was not cached.
    pub fn evict(&mut self, uid: EntityUid) -> Result<bool, StoreError> {
        let Some(entity) = self.live.peek(&uid).copied() else {
            return Ok(false);
        };
        self.write_back(entity)?;
        self.world.despawn(entity);
        self.live.remove(&uid);
        debug!(%uid, "entity evicted");
        Ok(true)
    }

    /// Write every cached entity, every cached map and the module table to
    /// disk. Nothing is evicted.
    pub fn flush_all(&mut self) -> Result<(), StoreError> {
        for uid in self.live.keys() {
            if let Some(entity) = self.live.peek(&uid).copied() {
                self.write_back(entity)?;
            }
        }
        for uid in self.maps.keys() {
            if let Some(map) = self.maps.peek(&uid) {
                self.files.write_map(&map.to_record())?;
            }
        }
        self.files.write_modules(&self.modules.to_table())?;
        debug!(
            entities = self.live.len(),
            maps = self.maps.len(),
            "store flushed"
        );
        Ok(())
    }

    /// Forget every cached entity and map without writing anything, then
    /// reload the module table from the temp root. Used after the temp root
    /// was replaced by a save game.
    pub fn reload(&mut self, load_order: &[String]) -> Result<(), StoreError> {
        for uid in self.live.keys() {
            self.live.remove(&uid);
        }
        clear_entities(&mut self.world);
        for uid in self.maps.keys() {
            self.maps.remove(&uid);
        }
        self.pinned_map = None;
        self.modules = match self.files.read_modules()? {
            Some(table) => ModuleRegistry::restore(&table, load_order)?,
            None => {
                let mut modules = ModuleRegistry::new();
                for name in load_order {
                    modules.register(name)?;
                }
                modules
            }
        };
        Ok(())
    }

    pub fn contains_map(&self, uid: MapUid) -> bool {
        self.maps.contains(&uid) || self.files.map_exists(uid)
    }

    /// Keep `uid` out of map eviction (the active map).
    pub fn pin_map(&mut self, uid: Option<MapUid>) {
        self.pinned_map = uid;
    }

    pub fn insert_map(&mut self, map: GameMap) -> Result<(), StoreError> {
        let uid = map.uid();
        self.maps.insert(uid, map);
        self.enforce_map_capacity(Some(uid))
    }

    pub fn get_map(&mut self, uid: MapUid) -> Result<&GameMap, StoreError> {
        self.map_mut(uid).map(|map| &*map)
    }

    pub fn map_mut(&mut self, uid: MapUid) -> Result<&mut GameMap, StoreError> {
        self.ensure_map(uid)?;
        self.maps.get_mut(&uid).ok_or(StoreError::MissingMap(uid))
    }

    /// Borrow a map and the entity arena together.
    pub fn map_and_world(&mut self, uid: MapUid) -> Result<(&mut GameMap, &mut World), StoreError> {
        self.ensure_map(uid)?;
        let map = self.maps.get_mut(&uid).ok_or(StoreError::MissingMap(uid))?;
        Ok((map, &mut self.world))
    }

    pub fn evict_map(&mut self, uid: MapUid) -> Result<bool, StoreError> {
        let Some(map) = self.maps.remove(&uid) else {
            return Ok(false);
        };
        self.files.write_map(&map.to_record())?;
        debug!(map = %uid, "map evicted");
        Ok(true)
    }

    fn ensure_map(&mut self, uid: MapUid) -> Result<(), StoreError> {
        if self.maps.contains(&uid) {
            return Ok(());
        }
        if !self.files.map_exists(uid) {
            return Err(StoreError::MissingMap(uid));
        }
        let record = self.files.read_map(uid)?;
        let map = GameMap::from_record(&record, self.leaf_capacity)?;
        self.maps.insert(uid, map);
        debug!(map = %uid, "map reloaded from disk");
        self.enforce_map_capacity(Some(uid))
    }

    fn write_back(&self, entity: Entity) -> Result<(), StoreError> {
        if let Some(record) = self.world.get_entity(entity).and_then(capture_entity) {
            self.files.write_entity(&record)?;
        }
        Ok(())
    }

    fn enforce_capacity(&mut self, keep: Option<EntityUid>) -> Result<(), StoreError> {
        let world = &self.world;
        // Tick participants and queued input stay resident.
        let victims = self.live.overflow(|uid, entity| {
            Some(*uid) == keep
                || world.get::<PendingAction>(*entity).is_some()
                || world.get::<MoveIntent>(*entity).is_some()
        });
        for uid in victims {
            self.evict(uid)?;
        }
        Ok(())
    }

    fn enforce_map_capacity(&mut self, keep: Option<MapUid>) -> Result<(), StoreError> {
        let pinned = self.pinned_map;
        let victims = self
            .maps
            .overflow(|uid, _| Some(*uid) == keep || Some(*uid) == pinned);
        for uid in victims {
            self.evict_map(uid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::combat::Health;
    use crate::components::creature::BehaviorKind;
    use crate::content::{ItemDef, ResourceBody, SpeciesDef};
    use crate::world::terrain::FLOOR;

    fn limits(entities: usize) -> StoreLimits {
        StoreLimits {
            entity_capacity: entities,
            map_capacity: 2,
            leaf_capacity: 4,
        }
    }

    fn open(dir: &tempfile::TempDir, entities: usize) -> EntityStore {
        let files = SaveFiles::new(dir.path().join("tmp"), dir.path().join("saves")).unwrap();
        EntityStore::open(files, BuilderRegistry::with_defaults(), limits(entities)).unwrap()
    }

    fn rat() -> ContentResource {
        ContentResource {
            id: ResourceId::new("base", "rat"),
            body: ResourceBody::Species(SpeciesDef {
                name: "Rat".to_string(),
                health: 4,
                action_points: 100,
                skills: Default::default(),
                behavior: BehaviorKind::Wander,
                hostile: true,
            }),
        }
    }

    fn record_of(store: &mut EntityStore, uid: EntityUid) -> crate::core::serialization::EntityRecord {
        let entity = store.get(uid).unwrap();
        capture_entity(store.world().entity(entity)).unwrap()
    }

    #[test]
    fn eviction_round_trip_is_component_equal() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        let uid = EntityUid(5);
        let entity = store.create(uid, &rat()).unwrap();
        store.world_mut().get_mut::<Health>(entity).unwrap().current = 2;
        let before = record_of(&mut store, uid);

        assert!(store.evict(uid).unwrap());
        assert!(!store.is_live(uid));
        assert!(store.contains(uid));

        assert_eq!(record_of(&mut store, uid), before);
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        assert!(matches!(
            store.get(EntityUid(999)),
            Err(StoreError::MissingEntity(EntityUid(999)))
        ));
    }

    #[test]
    fn capacity_evicts_least_recently_used_with_write_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 2);
        store.create(EntityUid(1), &rat()).unwrap();
        store.create(EntityUid(2), &rat()).unwrap();
        store.get(EntityUid(1)).unwrap();
        store.create(EntityUid(3), &rat()).unwrap();

        assert_eq!(store.live_count(), 2);
        assert!(!store.is_live(EntityUid(2)));
        assert!(store.files().entity_exists(EntityUid(2)));
        assert!(store.get(EntityUid(2)).is_ok());
    }

    #[test]
    fn pending_entities_are_not_evicted() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 1);
        let first = store.create(EntityUid(1), &rat()).unwrap();
        store
            .world_mut()
            .entity_mut(first)
            .insert(PendingAction::new(1.0));
        store.create(EntityUid(2), &rat()).unwrap();
        assert!(store.is_live(EntityUid(1)));
        assert!(store.is_live(EntityUid(2)));
    }

    #[test]
    fn queued_input_keeps_an_entity_resident() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 1);
        let first = store.create(EntityUid(1), &rat()).unwrap();
        store
            .world_mut()
            .entity_mut(first)
            .insert(MoveIntent { dx: 1, dy: 0 });
        store.create(EntityUid(2), &rat()).unwrap();
        store.trim().unwrap();
        assert!(store.is_live(EntityUid(1)));
        assert!(!store.is_live(EntityUid(2)));

        store.world_mut().entity_mut(first).remove::<MoveIntent>();
        store.get(EntityUid(2)).unwrap();
        assert!(!store.is_live(EntityUid(1)));
        assert!(store.files().entity_exists(EntityUid(1)));
    }

    #[test]
    fn create_rejects_used_uid_and_unknown_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        store.create(EntityUid(1), &rat()).unwrap();
        store.evict(EntityUid(1)).unwrap();
        assert!(matches!(
            store.create(EntityUid(1), &rat()),
            Err(StoreError::UidInUse(_))
        ));

        let mut empty = EntityStore::open(
            SaveFiles::new(dir.path().join("tmp2"), dir.path().join("saves2")).unwrap(),
            BuilderRegistry::new(),
            limits(8),
        )
        .unwrap();
        let coin = ContentResource {
            id: ResourceId::new("base", "coin"),
            body: ResourceBody::Item(ItemDef {
                name: "Coin".to_string(),
                weight: 0,
            }),
        };
        assert!(matches!(
            empty.create(EntityUid(2), &coin),
            Err(StoreError::UnregisteredBuilder(ResourceKind::Item))
        ));
        assert_eq!(empty.live_count(), 0);
        assert_eq!(empty.world_mut().entities().len(), 0);
    }

    #[test]
    fn failed_build_leaves_no_entity() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        let mislabeled = ContentResource {
            id: ResourceId::new("base", "odd"),
            body: ResourceBody::Item(ItemDef {
                name: "Odd".to_string(),
                weight: 1,
            }),
        };
        store
            .builders_mut()
            .register(Box::new(MislabeledBuilder));
        assert!(matches!(
            store.create(EntityUid(4), &mislabeled),
            Err(StoreError::Build { .. })
        ));
        assert!(!store.contains(EntityUid(4)));
        assert_eq!(store.world_mut().entities().len(), 0);
    }

    struct MislabeledBuilder;

    impl crate::content::EntityBuilder for MislabeledBuilder {
        fn kind(&self) -> ResourceKind {
            ResourceKind::Item
        }

        fn build(
            &self,
            resource: &ContentResource,
            _entity: &mut bevy_ecs::world::EntityWorldMut<'_>,
        ) -> Result<(), ContentError> {
            resource.as_species().map(|_| ())
        }
    }

    #[test]
    fn generated_uids_skip_existing_and_never_repeat() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        let base = store.register_modules(&["base".to_string()]).unwrap()[0];
        let taken = EntityUid::compose(base, 0).unwrap();
        store.create(taken, &rat()).unwrap();
        store.evict(taken).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..20 {
            let uid = store.generate_uid(base).unwrap();
            assert_ne!(uid, taken);
            assert!(!store.contains(uid));
            assert_eq!(uid.module(), base);
            assert!(seen.insert(uid));
        }
    }

    #[test]
    fn remove_deletes_file_and_map_placement() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        let map_uid = MapUid::compose(ModuleUid(1), 1);
        store
            .insert_map(GameMap::new(map_uid, 10, 10, FLOOR, 4))
            .unwrap();

        let uid = EntityUid(9);
        let entity = store.create(uid, &rat()).unwrap();
        store.world_mut().entity_mut(entity).insert(Position {
            map: map_uid,
            x: 2,
            y: 3,
        });
        store.map_mut(map_uid).unwrap().add_entity(uid, 2, 3).unwrap();
        store.flush_all().unwrap();
        assert!(store.files().entity_exists(uid));

        store.remove(uid).unwrap();
        assert!(!store.contains(uid));
        assert!(!store.files().entity_exists(uid));
        assert!(store.get_map(map_uid).unwrap().all_entities().is_empty());
        assert!(matches!(store.remove(uid), Err(StoreError::MissingEntity(_))));
    }

    #[test]
    fn maps_evict_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = open(&dir, 8);
        let uids: Vec<MapUid> = (1..=3).map(|i| MapUid::compose(ModuleUid(1), i)).collect();
        store.pin_map(Some(uids[0]));
        for uid in &uids {
            let mut map = GameMap::new(*uid, 8, 8, FLOOR, 4);
            map.add_entity(EntityUid(uid.0 as u64), 1, 1).unwrap();
            store.insert_map(map).unwrap();
        }

        // Capacity 2 with the first map pinned: the second one went to disk.
        assert!(store.files().map_exists(uids[1]));
        let reloaded = store.get_map(uids[1]).unwrap();
        assert!(reloaded.all_entities().contains(&EntityUid(uids[1].0 as u64)));
        assert!(matches!(
            store.get_map(MapUid::compose(ModuleUid(4), 4)),
            Err(StoreError::MissingMap(_))
        ));
    }
}
