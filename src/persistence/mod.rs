pub mod cache;
pub mod files;
pub mod modules;
pub mod store;

pub use cache::LruCache;
pub use files::SaveFiles;
pub use modules::{ModuleEntry, ModuleError, ModuleRegistry, ModuleTable, RUNTIME_MODULE};
pub use store::{EntityStore, StoreError, StoreLimits};
