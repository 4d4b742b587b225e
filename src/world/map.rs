use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::world::{EntityUid, MapUid};
use crate::spatial::{PointIndex, RegionIndex, SpatialError};
use crate::world::terrain::TerrainId;

/// One written rectangle of a region layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec<T> {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub uid: EntityUid,
    pub x: i32,
    pub y: i32,
}

/// On-disk form of a map: region lists plus the entity placement list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRecord {
    pub uid: MapUid,
    pub width: i32,
    pub height: i32,
    pub default_terrain: TerrainId,
    #[serde(default)]
    pub terrain: Vec<RegionSpec<TerrainId>>,
    #[serde(default)]
    pub elevation: Vec<RegionSpec<i16>>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

/// Authoritative spatial state for one play area.
#[derive(Debug, Clone)]
pub struct GameMap {
    uid: MapUid,
    terrain: RegionIndex<TerrainId>,
    elevation: RegionIndex<i16>,
    entities: PointIndex<EntityUid>,
}

impl GameMap {
    pub fn new(
        uid: MapUid,
        width: i32,
        height: i32,
        default_terrain: TerrainId,
        leaf_capacity: usize,
    ) -> Self {
        Self {
            uid,
            terrain: RegionIndex::new(width, height, default_terrain),
            elevation: RegionIndex::new(width, height, 0),
            entities: PointIndex::with_capacity(width, height, leaf_capacity),
        }
    }

    /// Build the terrain and elevation layers. Placements are applied by the
    /// caller, which owns entity creation.
    pub fn with_regions(
        mut self,
        terrain: &[RegionSpec<TerrainId>],
        elevation: &[RegionSpec<i16>],
    ) -> Result<Self, SpatialError> {
        for spec in terrain {
            self.terrain
                .insert(spec.value, spec.x, spec.y, spec.w, spec.h)?;
        }
        for spec in elevation {
            self.elevation
                .insert(spec.value, spec.x, spec.y, spec.w, spec.h)?;
        }
        Ok(self)
    }

    pub fn from_record(record: &MapRecord, leaf_capacity: usize) -> Result<Self, SpatialError> {
        let mut map = GameMap::new(
            record.uid,
            record.width,
            record.height,
            record.default_terrain,
            leaf_capacity,
        )
        .with_regions(&record.terrain, &record.elevation)?;
        for placement in &record.placements {
            map.add_entity(placement.uid, placement.x, placement.y)?;
        }
        Ok(map)
    }

    pub fn to_record(&self) -> MapRecord {
        let bounds = self.terrain.bounds();
        MapRecord {
            uid: self.uid,
            width: bounds.w,
            height: bounds.h,
            default_terrain: *self.terrain.default_value(),
            terrain: self
                .terrain
                .regions()
                .into_iter()
                .map(|(rect, value)| RegionSpec {
                    x: rect.x,
                    y: rect.y,
                    w: rect.w,
                    h: rect.h,
                    value,
                })
                .collect(),
            elevation: self
                .elevation
                .regions()
                .into_iter()
                .map(|(rect, value)| RegionSpec {
                    x: rect.x,
                    y: rect.y,
                    w: rect.w,
                    h: rect.h,
                    value,
                })
                .collect(),
            placements: self
                .entities
                .all()
                .into_iter()
                .filter_map(|uid| {
                    self.entities
                        .position(uid)
                        .map(|(x, y)| Placement { uid, x, y })
                })
                .collect(),
        }
    }

    pub fn uid(&self) -> MapUid {
        self.uid
    }

    pub fn width(&self) -> i32 {
        self.terrain.bounds().w
    }

    pub fn height(&self) -> i32 {
        self.terrain.bounds().h
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.terrain.bounds().contains(x, y)
    }

    pub fn terrain(&self) -> &RegionIndex<TerrainId> {
        &self.terrain
    }

    pub fn elevation(&self) -> &RegionIndex<i16> {
        &self.elevation
    }

    pub fn terrain_at(&self, x: i32, y: i32) -> TerrainId {
        self.terrain.get(x, y)
    }

    pub fn elevation_at(&self, x: i32, y: i32) -> i16 {
        self.elevation.get(x, y)
    }

    pub fn add_entity(&mut self, uid: EntityUid, x: i32, y: i32) -> Result<(), SpatialError> {
        self.entities.insert(uid, x, y)
    }

    pub fn move_entity(&mut self, uid: EntityUid, x: i32, y: i32) -> Result<(), SpatialError> {
        self.entities.move_to(uid, x, y)
    }

    pub fn remove_entity(&mut self, uid: EntityUid) -> Result<(i32, i32), SpatialError> {
        self.entities.remove(uid)
    }

    pub fn entities_at(&self, x: i32, y: i32) -> BTreeSet<EntityUid> {
        self.entities.get(x, y)
    }

    pub fn entities_in(&self, x: i32, y: i32, w: i32, h: i32) -> BTreeSet<EntityUid> {
        self.entities.get_in(x, y, w, h)
    }

    pub fn all_entities(&self) -> BTreeSet<EntityUid> {
        self.entities.all()
    }

    pub fn contains_entity(&self, uid: EntityUid) -> bool {
        self.entities.contains(uid)
    }

    pub fn position_of(&self, uid: EntityUid) -> Option<(i32, i32)> {
        self.entities.position(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::world::ModuleUid;
    use crate::world::terrain::{FLOOR, WALL, WATER};

    fn sample_map() -> GameMap {
        GameMap::new(MapUid::compose(ModuleUid(1), 4), 30, 20, FLOOR, 4)
            .with_regions(
                &[
                    RegionSpec { x: 0, y: 0, w: 30, h: 1, value: WALL },
                    RegionSpec { x: 5, y: 5, w: 4, h: 3, value: WATER },
                ],
                &[RegionSpec { x: 10, y: 10, w: 5, h: 5, value: 3 }],
            )
            .unwrap()
    }

    #[test]
    fn entity_operations_keep_index_consistent() {
        let mut map = sample_map();
        let a = EntityUid(11);
        let b = EntityUid(12);
        map.add_entity(a, 2, 2).unwrap();
        map.add_entity(b, 2, 2).unwrap();
        assert_eq!(map.entities_at(2, 2).len(), 2);

        map.move_entity(a, 3, 2).unwrap();
        assert_eq!(map.entities_at(2, 2).into_iter().collect::<Vec<_>>(), vec![b]);
        assert!(map.entities_at(3, 2).contains(&a));

        map.remove_entity(b).unwrap();
        assert_eq!(map.all_entities().into_iter().collect::<Vec<_>>(), vec![a]);
        assert!(map.remove_entity(b).is_err());
    }

    #[test]
    fn layers_read_back() {
        let map = sample_map();
        assert_eq!(map.terrain_at(7, 0), WALL);
        assert_eq!(map.terrain_at(6, 6), WATER);
        assert_eq!(map.terrain_at(20, 15), FLOOR);
        assert_eq!(map.elevation_at(12, 12), 3);
        assert_eq!(map.elevation_at(0, 19), 0);
    }

    #[test]
    fn record_round_trip_preserves_layers_and_placements() {
        let mut map = sample_map();
        map.add_entity(EntityUid(5), 1, 1).unwrap();
        map.add_entity(EntityUid(6), 29, 19).unwrap();

        let record = map.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let decoded: MapRecord = serde_json::from_str(&json).unwrap();
        let restored = GameMap::from_record(&decoded, 4).unwrap();

        assert_eq!(restored.uid(), map.uid());
        assert_eq!(restored.all_entities(), map.all_entities());
        assert_eq!(restored.position_of(EntityUid(6)), Some((29, 19)));
        for y in 0..20 {
            for x in 0..30 {
                assert_eq!(restored.terrain_at(x, y), map.terrain_at(x, y));
                assert_eq!(restored.elevation_at(x, y), map.elevation_at(x, y));
            }
        }
    }
}
