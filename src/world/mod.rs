pub mod map;
pub mod terrain;

pub use map::{GameMap, MapRecord, Placement, RegionSpec};
pub use terrain::{TerrainDef, TerrainId, TerrainKind, TerrainTable};
