use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw terrain value stored in a map's terrain region index.
pub type TerrainId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerrainKind {
    Ground,
    Liquid,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainDef {
    pub name: String,
    pub kind: TerrainKind,
}

/// Lookup from terrain id to its definition. An id missing here is a
/// configuration error once movement runs into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainTable(pub BTreeMap<TerrainId, TerrainDef>);

pub const FLOOR: TerrainId = 0;
pub const WALL: TerrainId = 1;
pub const WATER: TerrainId = 2;

impl Default for TerrainTable {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(FLOOR, def("floor", TerrainKind::Ground));
        table.insert(WALL, def("wall", TerrainKind::Solid));
        table.insert(WATER, def("water", TerrainKind::Liquid));
        Self(table)
    }
}

impl TerrainTable {
    pub fn resolve(&self, id: TerrainId) -> Option<&TerrainDef> {
        self.0.get(&id)
    }
}

fn def(name: &str, kind: TerrainKind) -> TerrainDef {
    TerrainDef {
        name: name.to_string(),
        kind,
    }
}
