pub mod builder;
pub mod demo;
pub mod library;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use builder::{BuilderRegistry, CreatureBuilder, EntityBuilder, ItemBuilder};
pub use library::ResourceLibrary;
pub use repository::{
    ContentError, ContentResource, ItemDef, LayoutPlacement, MapLayoutDef, ResourceBody,
    ResourceId, ResourceKind, ResourceRepository, SpeciesDef,
};
pub use sqlite::SqliteResourceRepository;
