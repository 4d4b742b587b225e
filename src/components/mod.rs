pub mod combat;
pub mod creature;
pub mod item;
pub mod task;
pub mod world;
