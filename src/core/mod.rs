pub mod config;
pub mod ecs;
pub mod error;
pub mod serialization;
pub mod world;

pub use config::{ConfigError, QueueDiscipline, SimConfig};
pub use error::SimError;
pub use world::{Control, Simulation};
