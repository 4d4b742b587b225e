use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::creature::{BehaviorKind, SkillKind};
use crate::world::map::RegionSpec;
use crate::world::terrain::TerrainId;

/// Namespaced content id, written `module:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(module: &str, name: &str) -> Self {
        Self(format!("{}:{}", module, name))
    }

    /// Owning module; an id without a `:` belongs to no module.
    pub fn module(&self) -> Option<&str> {
        self.0.split_once(':').map(|(module, _)| module)
    }

    pub fn name(&self) -> &str {
        self.0.split_once(':').map(|(_, name)| name).unwrap_or(&self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Species,
    Item,
    MapLayout,
}

impl ResourceKind {
    /// Storage namespace for this kind.
    pub fn namespace(self) -> &'static str {
        match self {
            ResourceKind::Species => "species",
            ResourceKind::Item => "items",
            ResourceKind::MapLayout => "maps",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    pub health: i32,
    pub action_points: i32,
    #[serde(default)]
    pub skills: BTreeMap<SkillKind, i32>,
    pub behavior: BehaviorKind,
    #[serde(default)]
    pub hostile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPlacement {
    pub resource: ResourceId,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayoutDef {
    pub local_uid: u16,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub default_terrain: TerrainId,
    #[serde(default)]
    pub terrain: Vec<RegionSpec<TerrainId>>,
    #[serde(default)]
    pub elevation: Vec<RegionSpec<i16>>,
    #[serde(default)]
    pub placements: Vec<LayoutPlacement>,
    /// Where the player lands when entering this map.
    #[serde(default)]
    pub player_start: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceBody {
    Species(SpeciesDef),
    Item(ItemDef),
    MapLayout(MapLayoutDef),
}

/// Immutable content template. Loaded once per id and shared by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResource {
    pub id: ResourceId,
    pub body: ResourceBody,
}

impl ContentResource {
    pub fn kind(&self) -> ResourceKind {
        match self.body {
            ResourceBody::Species(_) => ResourceKind::Species,
            ResourceBody::Item(_) => ResourceKind::Item,
            ResourceBody::MapLayout(_) => ResourceKind::MapLayout,
        }
    }

    pub fn as_species(&self) -> Result<&SpeciesDef, ContentError> {
        match &self.body {
            ResourceBody::Species(def) => Ok(def),
            _ => Err(self.wrong_kind(ResourceKind::Species)),
        }
    }

    pub fn as_item(&self) -> Result<&ItemDef, ContentError> {
        match &self.body {
            ResourceBody::Item(def) => Ok(def),
            _ => Err(self.wrong_kind(ResourceKind::Item)),
        }
    }

    pub fn as_map_layout(&self) -> Result<&MapLayoutDef, ContentError> {
        match &self.body {
            ResourceBody::MapLayout(def) => Ok(def),
            _ => Err(self.wrong_kind(ResourceKind::MapLayout)),
        }
    }

    fn wrong_kind(&self, expected: ResourceKind) -> ContentError {
        ContentError::WrongKind {
            id: self.id.clone(),
            expected,
            found: self.kind(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("malformed body for resource {id}: {source}")]
    Body {
        id: ResourceId,
        source: serde_json::Error,
    },

    #[error("resource {0} not found")]
    NotFound(ResourceId),

    #[error("resource {id} is {found:?}, expected {expected:?}")]
    WrongKind {
        id: ResourceId,
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("content schema version {found} does not match {expected}")]
    SchemaMismatch { found: i64, expected: i64 },
}

/// On-disk representation of content templates, keyed by namespace.
pub trait ResourceRepository: Send {
    fn load(&self, id: &ResourceId) -> Result<ContentResource, ContentError>;
    fn save(&mut self, resource: &ContentResource) -> Result<(), ContentError>;
    fn list_ids(&self, kind: ResourceKind) -> Result<Vec<ResourceId>, ContentError>;
    /// Returns whether a resource was actually removed.
    fn remove(&mut self, id: &ResourceId) -> Result<bool, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_splits_module() {
        let id = ResourceId::new("base", "goblin");
        assert_eq!(id.module(), Some("base"));
        assert_eq!(id.name(), "goblin");
        assert_eq!(ResourceId::from("loose").module(), None);
    }

    #[test]
    fn body_is_tagged_by_kind() {
        let resource = ContentResource {
            id: ResourceId::new("base", "dagger"),
            body: ResourceBody::Item(ItemDef {
                name: "Dagger".to_string(),
                weight: 2,
            }),
        };
        let json = serde_json::to_value(&resource.body).unwrap();
        assert_eq!(json["kind"], "ITEM");
        assert!(matches!(
            resource.as_species(),
            Err(ContentError::WrongKind { found: ResourceKind::Item, .. })
        ));
    }
}
